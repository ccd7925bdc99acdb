use crate::error::Error;
use crate::protocol::{PmValues, ProtocolKind};
use embedded_hal::delay::DelayNs;
use heapless::String;
use log::{debug, warn};

/// Capacity of the strings returned by [`Sps30::serial_number`] and [`Sps30::product_name`].
pub const INFO_LEN: usize = 32;

/// A status code returned by the Sensirion driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorCode(pub u8);

impl ErrorCode {
    /// The device returned a frame with an unexpected data length. Usually transient.
    pub const DATA_LENGTH: ErrorCode = ErrorCode(0x01);
    pub const UNKNOWN_COMMAND: ErrorCode = ErrorCode(0x02);
    pub const ACCESS_RIGHT: ErrorCode = ErrorCode(0x03);
    pub const PARAMETER: ErrorCode = ErrorCode(0x04);
    pub const OUT_OF_RANGE: ErrorCode = ErrorCode(0x28);
    pub const COMMAND_STATE: ErrorCode = ErrorCode(0x43);
    pub const TIMEOUT: ErrorCode = ErrorCode(0x50);
    pub const PROTOCOL: ErrorCode = ErrorCode(0x51);
    /// Returned by [`NoSps30`] for every request.
    pub const NOT_CONNECTED: ErrorCode = ErrorCode(0xFF);
}

/// Mass and number concentrations reported by an SPS30.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sps30Values {
    /// Mass Concentration PM1.0 [μg/m³]
    pub mass_pm1: f32,
    /// Mass Concentration PM2.5 [μg/m³]
    pub mass_pm2: f32,
    /// Mass Concentration PM4.0 [μg/m³]
    pub mass_pm4: f32,
    /// Mass Concentration PM10 [μg/m³]
    pub mass_pm10: f32,
    /// Number Concentration PM2.5 [#/cm³]
    pub num_pm2: f32,
    /// Typical Particle Size [μm]
    pub part_size: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sps30Version {
    pub major: u8,
    pub minor: u8,
    pub hardware: u8,
    pub shdlc_major: u8,
    pub shdlc_minor: u8,
    pub driver_major: u8,
    pub driver_minor: u8,
}

/// The vendor driver for Sensirion SPS30 sensors, over SHDLC or I2C.
///
/// The framing and checksums of either link are handled by the implementation.
pub trait Sps30 {
    /// Opens the communication channel to the sensor.
    fn begin(&mut self) -> Result<(), ErrorCode>;
    fn probe(&mut self) -> Result<(), ErrorCode>;
    fn reset(&mut self) -> Result<(), ErrorCode>;
    /// Starts continuous measurement.
    fn start(&mut self) -> Result<(), ErrorCode>;
    fn get_values(&mut self) -> Result<Sps30Values, ErrorCode>;
    fn serial_number(&mut self) -> Result<String<INFO_LEN>, ErrorCode>;
    fn product_name(&mut self) -> Result<String<INFO_LEN>, ErrorCode>;
    fn version(&mut self) -> Result<Sps30Version, ErrorCode>;

    /// Whether the driver talks I2C rather than SHDLC over the serial channel.
    fn uses_i2c(&self) -> bool {
        false
    }

    /// Enables the driver's own debug output.
    fn set_debugging(&mut self, _enabled: bool) {}

    /// Translates a status code to a human-readable message.
    fn describe_error(&self, code: ErrorCode) -> &'static str {
        match code {
            ErrorCode::DATA_LENGTH => "Wrong data length for this command",
            ErrorCode::UNKNOWN_COMMAND => "Unknown command",
            ErrorCode::ACCESS_RIGHT => "No access right for command",
            ErrorCode::PARAMETER => "Illegal command parameter or parameter out of allowed range",
            ErrorCode::OUT_OF_RANGE => "Internal function argument out of range",
            ErrorCode::COMMAND_STATE => "Command not allowed in current state",
            ErrorCode::TIMEOUT => "No response received within timeout period",
            ErrorCode::PROTOCOL => "Protocol error",
            ErrorCode::NOT_CONNECTED => "No Sensirion driver connected",
            _ => "Unknown error",
        }
    }
}

/// Placeholder driver for boards without a Sensirion sensor. Every request fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSps30;

impl Sps30 for NoSps30 {
    fn begin(&mut self) -> Result<(), ErrorCode> {
        Err(ErrorCode::NOT_CONNECTED)
    }

    fn probe(&mut self) -> Result<(), ErrorCode> {
        Err(ErrorCode::NOT_CONNECTED)
    }

    fn reset(&mut self) -> Result<(), ErrorCode> {
        Err(ErrorCode::NOT_CONNECTED)
    }

    fn start(&mut self) -> Result<(), ErrorCode> {
        Err(ErrorCode::NOT_CONNECTED)
    }

    fn get_values(&mut self) -> Result<Sps30Values, ErrorCode> {
        Err(ErrorCode::NOT_CONNECTED)
    }

    fn serial_number(&mut self) -> Result<String<INFO_LEN>, ErrorCode> {
        Err(ErrorCode::NOT_CONNECTED)
    }

    fn product_name(&mut self) -> Result<String<INFO_LEN>, ErrorCode> {
        Err(ErrorCode::NOT_CONNECTED)
    }

    fn version(&mut self) -> Result<Sps30Version, ErrorCode> {
        Err(ErrorCode::NOT_CONNECTED)
    }
}

/// Options to modify the behavior of [`read_sps30`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sps30Options {
    /// Wait before each read so the sensor can sync.
    pub sync_delay_ms: u32,
    /// How many times a [`ErrorCode::DATA_LENGTH`] result is retried before giving up. Any other
    /// error is returned immediately.
    pub data_length_retries: u8,
    /// Wait between data length retries.
    pub retry_backoff_ms: u32,
}

pub const DEFAULT_SPS30_OPTIONS: Sps30Options = Sps30Options {
    sync_delay_ms: 35,
    data_length_retries: 3,
    retry_backoff_ms: 1000,
};

impl Default for Sps30Options {
    fn default() -> Sps30Options {
        DEFAULT_SPS30_OPTIONS
    }
}

/// Reads PM2.5 and PM10 from the sensor, rounded to the nearest μg/m³.
///
/// This blocks on `delay` for [`Sps30Options::sync_delay_ms`], plus
/// [`Sps30Options::retry_backoff_ms`] for each data length retry.
pub fn read_sps30<TSps30, TDelay, TIoError>(
    driver: &mut TSps30,
    delay: &mut TDelay,
    options: &Sps30Options,
) -> Result<PmValues, Error<TIoError>>
where
    TSps30: Sps30,
    TDelay: DelayNs,
{
    delay.delay_ms(options.sync_delay_ms);
    let mut retries = 0u8;
    let values = loop {
        match driver.get_values() {
            Ok(values) => break values,
            Err(ErrorCode::DATA_LENGTH) if retries < options.data_length_retries => {
                retries += 1;
                delay.delay_ms(options.retry_backoff_ms);
            }
            Err(code) => {
                let message = driver.describe_error(code);
                warn!("[SPS30] error during reading values: {} ({:#04x})", message, code.0);
                return Err(Error::device_comm(message));
            }
        }
    };
    debug!("[SPS30] read > done!");

    PmValues {
        pm25: round_concentration(values.mass_pm2),
        pm10: round_concentration(values.mass_pm10),
    }
    .check(ProtocolKind::Sensirion)
}

/// NaN and negative concentrations become zero; huge ones saturate.
fn round_concentration(value: f32) -> u16 {
    libm::roundf(value) as u16
}

/// Identification read from a detected SPS30. Fields the driver could not provide are empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sps30Info {
    pub serial_number: String<INFO_LEN>,
    pub product_name: String<INFO_LEN>,
    pub version: Option<Sps30Version>,
}

/// Reads and logs the serial number, product name and firmware levels of the sensor.
pub fn read_device_info<TSps30: Sps30>(driver: &mut TSps30) -> Sps30Info {
    let mut info = Sps30Info::default();

    match driver.serial_number() {
        Ok(serial) if !serial.is_empty() => {
            debug!("[SPS30] Serial number : {}", serial);
            info.serial_number = serial;
        }
        Ok(_) => debug!("[SPS30] Serial number : not available"),
        Err(_) => debug!("[SPS30] could not get serial number"),
    }

    match driver.product_name() {
        Ok(name) if !name.is_empty() => {
            debug!("[SPS30] Product name  : {}", name);
            info.product_name = name;
        }
        Ok(_) => debug!("[SPS30] Product name  : not available"),
        Err(_) => debug!("[SPS30] could not get product name"),
    }

    match driver.version() {
        Ok(version) => {
            debug!("[SPS30] Firmware level: {}.{}", version.major, version.minor);
            if !driver.uses_i2c() {
                debug!("[SPS30] Hardware level: {}", version.hardware);
                debug!(
                    "[SPS30] SHDLC protocol: {}.{}",
                    version.shdlc_major, version.shdlc_minor
                );
            }
            debug!(
                "[SPS30] Library level : {}.{}",
                version.driver_major, version.driver_minor
            );
            info.version = Some(version);
        }
        Err(_) => debug!("[SPS30] can not read version info"),
    }

    info
}
