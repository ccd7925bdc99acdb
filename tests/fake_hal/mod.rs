#![allow(dead_code)]

pub mod clock;
pub mod delay;
pub mod humidity;
pub mod logger;
pub mod sps30;

/// A 32-byte Honeywell/Plantower frame carrying the given concentrations.
pub fn generic_frame(pm25: u16, pm10: u16) -> [u8; 32] {
    let mut frame = [0u8; 32];
    frame[0] = 0x42;
    frame[1] = 0x4D;
    frame[6..8].copy_from_slice(&pm25.to_be_bytes());
    frame[8..10].copy_from_slice(&pm10.to_be_bytes());
    frame
}

/// A 32-byte Panasonic frame carrying the given concentrations.
pub fn panasonic_frame(pm25: u16, pm10: u16) -> [u8; 32] {
    let mut frame = [0u8; 32];
    frame[0] = 0x02;
    frame[5..7].copy_from_slice(&pm25.to_le_bytes());
    frame[9..11].copy_from_slice(&pm10.to_le_bytes());
    frame
}
