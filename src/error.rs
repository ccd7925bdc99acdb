use crate::protocol::ProtocolKind;
use heapless::String;

/// The longest vendor error description kept in [`Error::DeviceComm`].
pub const MAX_MESSAGE_LEN: usize = 80;

/// Errors raised while reading or detecting a PM sensor.
///
/// The `Display` text of each variant is the human-readable message handed to the error callback
/// of [`Sensors`](crate::sensors::Sensors).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error<TIoError> {
    /// Wrapped error from the serial channel.
    #[error("serial channel error: {0:?}")]
    Wrapped(TIoError),
    /// The frame does not start with the header signature of the protocol being read.
    #[error("invalid {} sensor header", .0.label())]
    InvalidHeader(ProtocolKind),
    /// Both concentrations exceed the plausibility bound of the protocol.
    #[error("{} out of range pm25 > {limit}", .kind.label())]
    OutOfRange { kind: ProtocolKind, limit: u16 },
    /// The retry budget ran out before a complete frame arrived.
    #[error("sensor read fail")]
    ReadTimeout,
    /// The Sensirion driver reported a failure.
    #[error("Sensirion device error: {0}")]
    DeviceComm(String<MAX_MESSAGE_LEN>),
    /// No PM protocol has been detected or selected yet.
    #[error("PM sensor not configured")]
    NotConfigured,
    /// No supported PM sensor answered during detection.
    #[error("PM sensor detection failed")]
    DetectionFailed,
}

impl<TIoError> From<TIoError> for Error<TIoError> {
    fn from(error: TIoError) -> Error<TIoError> {
        Error::Wrapped(error)
    }
}

impl<TIoError> Error<TIoError> {
    /// Builds a [`Error::DeviceComm`] from a driver message, truncating it if needed.
    pub fn device_comm(message: &str) -> Error<TIoError> {
        let mut text = String::new();
        for c in message.chars() {
            if text.push(c).is_err() {
                break;
            }
        }
        Error::DeviceComm(text)
    }
}
