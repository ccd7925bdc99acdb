#![no_std]

extern crate alloc;

/// The serial channel shared by the PM sensors, and the frame reader used on it.
pub mod channel;
/// Start-up detection of the attached PM sensor.
pub mod detector;
pub mod error;
pub mod humidity;
/// Frame layouts and decoding for Honeywell/Plantower and Panasonic PM sensors.
pub mod protocol;
/// Polls a PM sensor and a humidity sensor on a fixed cadence, reporting through callbacks.
pub mod sensors;
/// Reads Sensirion SPS30 PM sensors through their vendor driver.
///
/// Refer to [this datasheet](https://sensirion.com/media/documents/8600FF88/616542B5/Sensirion_PM_Sensors_Datasheet_SPS30.pdf)
/// for more information about these devices.
pub mod sps30;

pub use error::Error;
pub use protocol::ProtocolKind;
pub use sensors::{Reading, Sensors};
