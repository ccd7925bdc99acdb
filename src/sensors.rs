use crate::channel::{
    read_frame, ByteChannel, ChannelConfig, GENERIC_BAUD_RATE, SENSIRION_BAUD_RATE,
};
use crate::detector::{DetectOptions, DetectState, Detection, Detector, DEFAULT_DETECT_OPTIONS};
use crate::error::Error;
use crate::humidity::{nan_as_zero, HumiditySensor};
use crate::protocol::{PmValues, ProtocolKind, UNSET_DEVICE_TYPE};
use crate::sps30::{read_sps30, Sps30, Sps30Info, Sps30Options, DEFAULT_SPS30_OPTIONS};
use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use core::fmt;
use core::time::Duration;
use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

/// The last values read from the sensors.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Reading {
    /// PM1.0 [μg/m³]. None of the supported protocols report it yet, so it stays zero.
    pub pm1: u16,
    /// PM2.5 [μg/m³]
    pub pm25: u16,
    /// PM10 [μg/m³]
    pub pm10: u16,
    /// Relative humidity [%RH], zero if the sensor failed.
    pub humidity: f32,
    /// Temperature [°C], zero if the sensor failed.
    pub temperature: f32,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PM1:{:03} PM25:{:03} PM10:{:03} H:{:02}% T:{:02}C",
            self.pm1, self.pm25, self.pm10, self.humidity as i32, self.temperature as i32
        )
    }
}

/// Options to modify the behavior of [`Sensors`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {
    /// Minimum time between two samples, in seconds. Zero samples on every poll.
    pub sample_time_secs: u32,
    /// Logs progress, errors and one reading line per sample.
    pub debug: bool,
    /// Read passes per serial frame. See [`read_frame`].
    pub frame_retry_budget: u32,
    pub detect: DetectOptions,
    pub sps30: Sps30Options,
    /// Wait after [`Sensors::restart`] re-initializes the sensors.
    pub restart_settle_ms: u32,
}

pub const DEFAULT_OPTIONS: Options = Options {
    sample_time_secs: 5,
    debug: false,
    frame_retry_budget: 1000,
    detect: DEFAULT_DETECT_OPTIONS,
    sps30: DEFAULT_SPS30_OPTIONS,
    restart_settle_ms: 100,
};

impl Default for Options {
    fn default() -> Options {
        DEFAULT_OPTIONS
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct InitArgs {
    kind: Option<ProtocolKind>,
    rx_pin: Option<u8>,
    tx_pin: Option<u8>,
}

/// Polls one PM sensor and one humidity sensor on a fixed cadence.
///
/// The PM sensor shares `channel` with every serial protocol, and the Sensirion driver is only
/// used when that protocol is requested or detected. Use [`NoSps30`](crate::sps30::NoSps30) or
/// [`NoHumiditySensor`](crate::humidity::NoHumiditySensor) for missing parts.
///
/// Nothing runs in the background: call [`Sensors::poll`] from the main loop.
pub struct Sensors<'a, TChannel, THumidity, TSps30, TDelay, TimeFn, ElapsedFn, TTime>
where
    TimeFn: Fn() -> TTime,
    ElapsedFn: Fn(TTime) -> Duration,
    TTime: Copy,
{
    channel: TChannel,
    humidity_sensor: THumidity,
    sps30: TSps30,
    delay: TDelay,
    time_fn: TimeFn,
    elapsed_since_fn: ElapsedFn,
    last_sample_time: Option<TTime>,
    options: Options,
    detector: Detector,
    init_args: InitArgs,
    reading: Reading,
    data_ready: bool,
    on_data: Option<Box<dyn FnMut() + 'a>>,
    on_error: Option<Box<dyn FnMut(&str) + 'a>>,
}

impl<'a, TChannel, TIoError, THumidity, TSps30, TDelay, TimeFn, ElapsedFn, TTime>
    Sensors<'a, TChannel, THumidity, TSps30, TDelay, TimeFn, ElapsedFn, TTime>
where
    TChannel: ByteChannel<Error = TIoError>,
    TIoError: fmt::Debug,
    THumidity: HumiditySensor,
    TSps30: Sps30,
    TDelay: DelayNs,
    TimeFn: Fn() -> TTime,
    ElapsedFn: Fn(TTime) -> Duration,
    TTime: Copy,
{
    /// Constructs the sensors with [`DEFAULT_OPTIONS`]. Nothing is read until [`Sensors::init`].
    ///
    /// The provided `time_fn` closure should provide some representation of a given instant that
    /// can be used with `elapsed_since_fn` to determine how much time has passed since then. It
    /// does not need to reflect real dates and times; millisecond precision is plenty.
    pub fn new(
        channel: TChannel,
        humidity_sensor: THumidity,
        sps30: TSps30,
        delay: TDelay,
        time_fn: TimeFn,
        elapsed_since_fn: ElapsedFn,
    ) -> Self {
        Self::with_options(
            channel,
            humidity_sensor,
            sps30,
            delay,
            time_fn,
            elapsed_since_fn,
            DEFAULT_OPTIONS,
        )
    }

    pub fn with_options(
        channel: TChannel,
        humidity_sensor: THumidity,
        sps30: TSps30,
        delay: TDelay,
        time_fn: TimeFn,
        elapsed_since_fn: ElapsedFn,
        options: Options,
    ) -> Self {
        Sensors {
            channel,
            humidity_sensor,
            sps30,
            delay,
            time_fn,
            elapsed_since_fn,
            last_sample_time: None,
            detector: Detector::new(options.detect),
            options,
            init_args: InitArgs::default(),
            reading: Reading::default(),
            data_ready: false,
            on_data: None,
            on_error: None,
        }
    }

    /// Opens the PM sensor channel, detects the attached sensor and starts the humidity sensor.
    ///
    /// With `kind` set to `None`, Honeywell/Plantower and Panasonic are auto-detected at 9600 baud.
    /// `Some(ProtocolKind::Sensirion)` opens the channel at 115200 baud and starts the SPS30 first.
    /// The pins are forwarded to [`ByteChannel::configure`].
    ///
    /// This blocks for at least [`DetectOptions::settle_delay_ms`]. On failure the error callback
    /// is called and no protocol is selected, so every poll reports [`Error::NotConfigured`] until
    /// [`Sensors::restart`] succeeds.
    pub fn init(
        &mut self,
        kind: Option<ProtocolKind>,
        rx_pin: Option<u8>,
        tx_pin: Option<u8>,
    ) -> Result<Detection, Error<TIoError>> {
        self.detector.reset();
        self.init_args = InitArgs {
            kind,
            rx_pin,
            tx_pin,
        };
        if self.options.debug {
            debug!("[SENSORS] debug is enabled.");
            debug!(
                "[SENSORS] sample time set to: {}",
                self.options.sample_time_secs
            );
        }

        let result = self.detect_pm_sensor();
        if let Err(err) = &result {
            self.report_error(err);
        }

        if self.options.debug {
            debug!("[SENSORS] starting humidity sensor..");
        }
        self.humidity_sensor.begin();
        result
    }

    fn detect_pm_sensor(&mut self) -> Result<Detection, Error<TIoError>> {
        let baud_rate = match self.init_args.kind {
            Some(ProtocolKind::Sensirion) => SENSIRION_BAUD_RATE,
            _ => GENERIC_BAUD_RATE,
        };
        let config = ChannelConfig {
            baud_rate,
            rx_pin: self.init_args.rx_pin,
            tx_pin: self.init_args.tx_pin,
        };
        self.detector.run(
            self.init_args.kind,
            &config,
            &mut self.channel,
            &mut self.sps30,
            &mut self.delay,
            self.options.frame_retry_budget,
            self.options.debug,
        )
    }

    /// Flushes the channel and runs [`Sensors::init`] again with the previous arguments.
    pub fn restart(&mut self) -> Result<Detection, Error<TIoError>> {
        nb::block!(self.channel.flush())?;
        let InitArgs {
            kind,
            rx_pin,
            tx_pin,
        } = self.init_args;
        let result = self.init(kind, rx_pin, tx_pin);
        self.delay.delay_ms(self.options.restart_settle_ms);
        result
    }

    /// Samples all sensors if the sample time has passed since the last sample.
    ///
    /// Returns whether a sample was taken. Each sample clears the data-ready flag, reads the
    /// humidity sensor and then the PM sensor. A successful PM read updates the PM values, calls
    /// the data callback and sets the data-ready flag. A failed read calls the error callback once
    /// and keeps the previous PM values.
    ///
    /// PM reads block while the frame is read, or for [`Sps30Options::sync_delay_ms`] (plus any
    /// retry backoff) with a Sensirion sensor.
    #[doc(alias = "loop")]
    pub fn poll(&mut self) -> bool {
        if let Some(last_sample_time) = self.last_sample_time {
            let sample_time = Duration::from_secs(self.options.sample_time_secs as u64);
            if (self.elapsed_since_fn)(last_sample_time) < sample_time {
                return false;
            }
        }

        self.data_ready = false;
        self.last_sample_time = Some((self.time_fn)());
        self.read_humidity();
        match self.read_pm() {
            Ok(values) => {
                self.reading.pm25 = values.pm25;
                self.reading.pm10 = values.pm10;
                if let Some(on_data) = self.on_data.as_mut() {
                    on_data();
                }
                self.data_ready = true;
            }
            Err(err) => self.report_error(&err),
        }

        if self.options.debug {
            info!("[SENSORS] {}", self.reading);
        }
        true
    }

    fn read_humidity(&mut self) {
        self.reading.humidity = nan_as_zero(self.humidity_sensor.read_humidity());
        self.reading.temperature = nan_as_zero(self.humidity_sensor.read_temperature());
    }

    fn read_pm(&mut self) -> Result<PmValues, Error<TIoError>> {
        let kind = self.pm_kind().ok_or(Error::NotConfigured)?;
        match kind.frame_layout() {
            Some(layout) => {
                let frame = read_frame(
                    &mut self.channel,
                    self.options.frame_retry_budget,
                    layout.min_len(),
                )?;
                layout.decode(&frame)
            }
            None => read_sps30(&mut self.sps30, &mut self.delay, &self.options.sps30),
        }
    }

    fn report_error(&mut self, err: &Error<TIoError>) {
        if self.options.debug {
            warn!("[SENSORS] {}", err);
        }
        if let Some(on_error) = self.on_error.as_mut() {
            on_error(&err.to_string());
        }
    }

    /// Sets the minimum time between samples. Zero samples on every poll.
    pub fn set_sample_time(&mut self, seconds: u32) {
        self.options.sample_time_secs = seconds;
    }

    /// Called after every successful sample. Read the values with the getters once
    /// [`Sensors::poll`] returns.
    pub fn set_on_data_callback<F>(&mut self, callback: F)
    where
        F: FnMut() + 'a,
    {
        self.on_data = Some(Box::new(callback));
    }

    /// Called with a human-readable message whenever detection or a sample fails.
    pub fn set_on_error_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&str) + 'a,
    {
        self.on_error = Some(Box::new(callback));
    }

    pub fn set_debug_mode(&mut self, enabled: bool) {
        self.options.debug = enabled;
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Whether the last sample read the PM sensor successfully.
    pub fn is_data_ready(&self) -> bool {
        self.data_ready
    }

    pub fn reading(&self) -> Reading {
        self.reading
    }

    pub fn pm1(&self) -> u16 {
        self.reading.pm1
    }

    pub fn pm25(&self) -> u16 {
        self.reading.pm25
    }

    pub fn pm10(&self) -> u16 {
        self.reading.pm10
    }

    /// PM1.0 zero-padded to at least three digits, e.g. `"007"`.
    pub fn pm1_string(&self) -> String {
        format!("{:03}", self.reading.pm1)
    }

    pub fn pm25_string(&self) -> String {
        format!("{:03}", self.reading.pm25)
    }

    pub fn pm10_string(&self) -> String {
        format!("{:03}", self.reading.pm10)
    }

    pub fn humidity(&self) -> f32 {
        self.reading.humidity
    }

    pub fn temperature(&self) -> f32 {
        self.reading.temperature
    }

    pub fn is_pm_sensor_configured(&self) -> bool {
        self.pm_kind().is_some()
    }

    pub fn pm_kind(&self) -> Option<ProtocolKind> {
        self.detector.detection().map(|detection| detection.kind)
    }

    /// The detected device name, or `""` if none was detected.
    pub fn pm_device_selected(&self) -> &'static str {
        self.detector
            .detection()
            .map_or("", |detection| detection.label)
    }

    /// The detected [`ProtocolKind::code`], or [`UNSET_DEVICE_TYPE`].
    pub fn pm_device_type_selected(&self) -> i8 {
        self.pm_kind().map_or(UNSET_DEVICE_TYPE, ProtocolKind::code)
    }

    pub fn detect_state(&self) -> DetectState {
        self.detector.state()
    }

    /// Identification of the SPS30, if one was probed during detection.
    pub fn sps30_info(&self) -> Option<&Sps30Info> {
        self.detector.sps30_info()
    }
}
