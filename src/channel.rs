use crate::error::Error;
use embedded_hal_nb::serial::{Read, Write};
use heapless::Vec;

/// The number of bytes in a complete PM sensor frame.
pub const FRAME_LEN: usize = 32;

/// Raw bytes read for a single decode attempt.
pub type Frame = Vec<u8, FRAME_LEN>;

/// Baud rate used by Honeywell, Plantower and Panasonic sensors, and while auto-detecting them.
pub const GENERIC_BAUD_RATE: u32 = 9600;
/// Baud rate used by Sensirion sensors over UART.
pub const SENSIRION_BAUD_RATE: u32 = 115_200;

/// UART settings for a protocol family. Frames are always 8N1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    pub baud_rate: u32,
    /// Receive pin, or `None` to keep the board default.
    pub rx_pin: Option<u8>,
    /// Transmit pin, or `None` to keep the board default.
    pub tx_pin: Option<u8>,
}

/// A serial port shared by every supported PM sensor.
///
/// Reading a byte returns [`nb::Error::WouldBlock`] when no byte is available.
pub trait ByteChannel: Read<u8> + Write<u8> {
    /// (Re)opens the port with the given settings.
    fn configure(&mut self, config: &ChannelConfig) -> Result<(), Self::Error>;
}

/// Reads one frame from the channel.
///
/// Each of the `retry_budget` attempts drains every byte the channel currently has available.
/// There is no delay between attempts, so the budget only bounds how long the channel buffer is
/// polled. Bytes past [`FRAME_LEN`] that arrive within the same attempt are dropped.
///
/// A full frame returns at once. Otherwise the bytes collected when the budget runs out are
/// returned if there are at least `min_len` of them, e.g. a sensor that only sends the header and
/// concentrations. Returns [`Error::ReadTimeout`] for anything shorter.
pub fn read_frame<TChannel, TIoError>(
    channel: &mut TChannel,
    retry_budget: u32,
    min_len: usize,
) -> Result<Frame, Error<TIoError>>
where
    TChannel: Read<u8, Error = TIoError>,
{
    let mut frame = Frame::new();
    for _ in 0..retry_budget {
        loop {
            match channel.read() {
                Ok(byte) => {
                    // Full frames ignore the rest of the backlog.
                    let _ = frame.push(byte);
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(err)) => return Err(Error::Wrapped(err)),
            }
        }
        if frame.is_full() {
            return Ok(frame);
        }
    }
    if frame.len() >= min_len {
        return Ok(frame);
    }
    Err(Error::ReadTimeout)
}
