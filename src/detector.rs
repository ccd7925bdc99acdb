use crate::channel::{read_frame, ByteChannel, ChannelConfig, GENERIC_BAUD_RATE};
use crate::error::Error;
use crate::protocol::{FrameLayout, ProtocolKind, GENERIC_LAYOUT, PANASONIC_LAYOUT};
use crate::sps30::{read_device_info, Sps30, Sps30Info};
use core::fmt::Debug;
use embedded_hal::delay::DelayNs;
use log::{debug, warn};

/// Where the detector is in its probe sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectState {
    Idle,
    ProbingSensirion,
    ProbingGenericPanasonic,
    Detected(ProtocolKind),
    /// Every attempt failed. Only a new [`Detector::run`] leaves this state.
    Failed,
}

/// The protocol chosen by a successful detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Detection {
    pub kind: ProtocolKind,
    /// Human-readable device name, e.g. `"HONEYWELL"`.
    pub label: &'static str,
}

impl Detection {
    pub fn new(kind: ProtocolKind) -> Detection {
        Detection {
            kind,
            label: kind.label(),
        }
    }
}

/// Options to modify the behavior of the [`Detector`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectOptions {
    /// Wait before each attempt so the channel can sync after being (re)configured.
    pub settle_delay_ms: u32,
    /// How many times a failed attempt is repeated. The total number of attempts is one more.
    pub retries: u8,
    /// Also try the Sensirion driver when no protocol was requested. Only useful when the driver
    /// does not share the 9600 baud serial channel, e.g. over I2C.
    pub probe_sensirion_on_auto: bool,
}

pub const DEFAULT_DETECT_OPTIONS: DetectOptions = DetectOptions {
    settle_delay_ms: 1000,
    retries: 2,
    probe_sensirion_on_auto: false,
};

impl Default for DetectOptions {
    fn default() -> DetectOptions {
        DEFAULT_DETECT_OPTIONS
    }
}

/// Finds out which PM sensor is attached by probing the supported protocols in priority order:
/// Sensirion (if requested), then Honeywell/Plantower, then Panasonic.
#[derive(Debug)]
pub struct Detector {
    options: DetectOptions,
    state: DetectState,
    sps30_info: Option<Sps30Info>,
}

impl Detector {
    pub fn new(options: DetectOptions) -> Detector {
        Detector {
            options,
            state: DetectState::Idle,
            sps30_info: None,
        }
    }

    pub fn options(&self) -> &DetectOptions {
        &self.options
    }

    pub fn state(&self) -> DetectState {
        self.state
    }

    /// The result of the last run, if it succeeded.
    pub fn detection(&self) -> Option<Detection> {
        match self.state {
            DetectState::Detected(kind) => Some(Detection::new(kind)),
            _ => None,
        }
    }

    /// Identification of the SPS30, if one answered the last probe.
    pub fn sps30_info(&self) -> Option<&Sps30Info> {
        self.sps30_info.as_ref()
    }

    /// Forgets any previous result.
    pub fn reset(&mut self) {
        self.state = DetectState::Idle;
        self.sps30_info = None;
    }

    /// Runs detection against live traffic.
    ///
    /// `requested` selects the probe path: `Some(ProtocolKind::Sensirion)` starts with the
    /// Sensirion driver, anything else goes straight to the serial frame protocols (unless
    /// [`DetectOptions::probe_sensirion_on_auto`] is set). Honeywell is always tried before
    /// Panasonic, so a stream that happens to satisfy both is reported as Honeywell.
    ///
    /// The channel is opened with `config` for the Sensirion driver, and reopened at
    /// [`GENERIC_BAUD_RATE`] (same pins) whenever the serial frames are probed. It is only
    /// reconfigured when the baud rate changes.
    ///
    /// Each attempt blocks for [`DetectOptions::settle_delay_ms`] first. Serial probes use
    /// `frame_retry_budget` passes per frame (see [`read_frame`]). Probe failures are logged and
    /// never returned; once all attempts fail this returns [`Error::DetectionFailed`]. A channel
    /// that cannot be configured fails the run at once with [`Error::Wrapped`].
    #[allow(clippy::too_many_arguments)]
    pub fn run<TChannel, TSps30, TDelay, TIoError>(
        &mut self,
        requested: Option<ProtocolKind>,
        config: &ChannelConfig,
        channel: &mut TChannel,
        sps30: &mut TSps30,
        delay: &mut TDelay,
        frame_retry_budget: u32,
        debug_driver: bool,
    ) -> Result<Detection, Error<TIoError>>
    where
        TChannel: ByteChannel<Error = TIoError>,
        TSps30: Sps30,
        TDelay: DelayNs,
        TIoError: Debug,
    {
        self.reset();
        let try_sensirion = match requested {
            Some(ProtocolKind::Sensirion) => true,
            Some(_) => false,
            None => self.options.probe_sensirion_on_auto,
        };

        let mut link = Link::new(config);
        let first_baud_rate = if try_sensirion {
            config.baud_rate
        } else {
            GENERIC_BAUD_RATE
        };
        link.open(channel, first_baud_rate)?;

        for attempt in 0..=self.options.retries {
            delay.delay_ms(self.options.settle_delay_ms);

            if try_sensirion {
                link.open(channel, config.baud_rate)?;
                self.state = DetectState::ProbingSensirion;
                debug!("[PMSENSOR] detecting Sensirion sensor..");
                if self.init_sps30(sps30, debug_driver) {
                    return Ok(self.detected(ProtocolKind::Sensirion));
                }
            }

            link.open(channel, GENERIC_BAUD_RATE)?;
            self.state = DetectState::ProbingGenericPanasonic;
            debug!("[PMSENSOR] detecting Honeywell/Plantower sensor..");
            if probe_frame(&GENERIC_LAYOUT, channel, frame_retry_budget) {
                return Ok(self.detected(ProtocolKind::Honeywell));
            }
            debug!("[PMSENSOR] detecting Panasonic sensor..");
            if probe_frame(&PANASONIC_LAYOUT, channel, frame_retry_budget) {
                return Ok(self.detected(ProtocolKind::Panasonic));
            }
            debug!(
                "[PMSENSOR] detection attempt {} failed",
                u16::from(attempt) + 1
            );
        }

        self.state = DetectState::Failed;
        warn!("[PMSENSOR] detection failed!");
        Err(Error::DetectionFailed)
    }

    fn detected(&mut self, kind: ProtocolKind) -> Detection {
        self.state = DetectState::Detected(kind);
        debug!("[PMSENSOR] detected: {}", kind.label());
        Detection::new(kind)
    }

    /// Steps that fail are logged and the sequence carries on, but only a successful reset and
    /// start count as detected.
    fn init_sps30<TSps30: Sps30>(&mut self, sps30: &mut TSps30, debug_driver: bool) -> bool {
        debug!("[SPS30] starting SPS30 sensor..");
        sps30.set_debugging(debug_driver);

        if let Err(code) = sps30.begin() {
            warn!(
                "[SPS30] could not initialize communication channel: {}",
                sps30.describe_error(code)
            );
        }

        match sps30.probe() {
            Ok(()) => {
                debug!("[SPS30] Detected SPS30.");
                self.sps30_info = Some(read_device_info(sps30));
            }
            Err(code) => warn!(
                "[SPS30] could not probe / connect with SPS30: {}",
                sps30.describe_error(code)
            ),
        }

        let reset = sps30.reset();
        if let Err(code) = reset {
            warn!("[SPS30] could not reset: {}", sps30.describe_error(code));
        }

        let start = sps30.start();
        match start {
            Ok(()) => debug!("[SPS30] Measurement OK"),
            Err(code) => warn!(
                "[SPS30] could NOT start measurement: {}",
                sps30.describe_error(code)
            ),
        }

        reset.is_ok() && start.is_ok()
    }
}

/// Tracks the baud rate the channel was last opened with.
struct Link<'c> {
    config: &'c ChannelConfig,
    baud_rate: Option<u32>,
}

impl<'c> Link<'c> {
    fn new(config: &'c ChannelConfig) -> Link<'c> {
        Link {
            config,
            baud_rate: None,
        }
    }

    fn open<TChannel: ByteChannel>(
        &mut self,
        channel: &mut TChannel,
        baud_rate: u32,
    ) -> Result<(), TChannel::Error> {
        if self.baud_rate != Some(baud_rate) {
            debug!("[PMSENSOR] opening channel at {} baud", baud_rate);
            channel.configure(&ChannelConfig {
                baud_rate,
                ..*self.config
            })?;
            self.baud_rate = Some(baud_rate);
        }
        Ok(())
    }
}

fn probe_frame<TChannel, TIoError>(
    layout: &FrameLayout,
    channel: &mut TChannel,
    frame_retry_budget: u32,
) -> bool
where
    TChannel: ByteChannel<Error = TIoError>,
    TIoError: Debug,
{
    let result = read_frame(channel, frame_retry_budget, layout.min_len())
        .and_then(|frame| layout.decode::<TIoError>(&frame));
    match result {
        Ok(values) => {
            debug!(
                "[PMSENSOR] {} read > done! pm25: {} pm10: {}",
                layout.kind.label(),
                values.pm25,
                values.pm10
            );
            true
        }
        Err(err) => {
            debug!("[PMSENSOR] {} probe: {}", layout.kind.label(), err);
            false
        }
    }
}
