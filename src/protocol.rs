use crate::error::Error;

/// The numeric device type reported while no PM protocol is selected.
pub const UNSET_DEVICE_TYPE: i8 = -1;

/// The PM sensor protocol families that can be detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolKind {
    /// Honeywell HPMA and Plantower PMSx003 sensors, which share the generic `BM` frame.
    Honeywell = 0,
    /// Panasonic SN-GCJA5 sensors.
    Panasonic = 1,
    /// Sensirion SPS30 sensors, read through their vendor driver.
    Sensirion = 2,
}

impl ProtocolKind {
    /// The numeric device type of this protocol. See [`UNSET_DEVICE_TYPE`] for the unset value.
    pub const fn code(self) -> i8 {
        self as i8
    }

    /// The device name reported once this protocol is detected.
    pub const fn label(self) -> &'static str {
        match self {
            ProtocolKind::Honeywell => "HONEYWELL",
            ProtocolKind::Panasonic => "PANASONIC",
            ProtocolKind::Sensirion => "SENSIRION",
        }
    }

    /// Readings are rejected only when *both* PM2.5 and PM10 exceed this bound.
    pub const fn limit(self) -> u16 {
        match self {
            ProtocolKind::Honeywell => GENERIC_LAYOUT.limit,
            ProtocolKind::Panasonic => PANASONIC_LAYOUT.limit,
            ProtocolKind::Sensirion => SENSIRION_LIMIT,
        }
    }

    /// The raw frame layout of this protocol, or `None` if frames are handled by a vendor driver.
    pub fn frame_layout(self) -> Option<&'static FrameLayout> {
        match self {
            ProtocolKind::Honeywell => Some(&GENERIC_LAYOUT),
            ProtocolKind::Panasonic => Some(&PANASONIC_LAYOUT),
            ProtocolKind::Sensirion => None,
        }
    }
}

/// A 16-bit concentration split across two frame bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    /// Index of the most-significant byte.
    pub high: usize,
    /// Index of the least-significant byte.
    pub low: usize,
}

impl Field {
    /// Frame bytes needed to hold both halves.
    const fn end(&self) -> usize {
        if self.high > self.low {
            self.high + 1
        } else {
            self.low + 1
        }
    }

    /// Missing bytes read as zero.
    fn extract(&self, frame: &[u8]) -> u16 {
        let high = frame.get(self.high).copied().unwrap_or(0);
        let low = frame.get(self.low).copied().unwrap_or(0);
        u16::from_be_bytes([high, low])
    }
}

/// Describes where a serial PM sensor puts its header and concentrations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameLayout {
    pub kind: ProtocolKind,
    /// The bytes every frame must start with.
    pub header: &'static [u8],
    pub pm25: Field,
    pub pm10: Field,
    /// See [`ProtocolKind::limit`].
    pub limit: u16,
}

/// Honeywell/Plantower: `0x42 0x4D`, big-endian fields at 6-7 and 8-9.
pub const GENERIC_LAYOUT: FrameLayout = FrameLayout {
    kind: ProtocolKind::Honeywell,
    header: &[0x42, 0x4D],
    pm25: Field { high: 6, low: 7 },
    pm10: Field { high: 8, low: 9 },
    limit: 1000,
};

/// Panasonic: `0x02`, little-endian fields at 5-6 and 9-10.
pub const PANASONIC_LAYOUT: FrameLayout = FrameLayout {
    kind: ProtocolKind::Panasonic,
    header: &[0x02],
    pm25: Field { high: 6, low: 5 },
    pm10: Field { high: 10, low: 9 },
    limit: 2000,
};

const SENSIRION_LIMIT: u16 = 1000;

/// PM concentrations decoded from one sensor sample, in μg/m³.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PmValues {
    pub pm25: u16,
    pub pm10: u16,
}

impl PmValues {
    /// Applies the plausibility bound of `kind`.
    pub fn check<TIoError>(self, kind: ProtocolKind) -> Result<PmValues, Error<TIoError>> {
        let limit = kind.limit();
        if self.pm25 > limit && self.pm10 > limit {
            return Err(Error::OutOfRange { kind, limit });
        }
        Ok(self)
    }
}

impl FrameLayout {
    /// The shortest frame that holds the header and both concentrations.
    pub const fn min_len(&self) -> usize {
        let mut len = self.header.len();
        if self.pm25.end() > len {
            len = self.pm25.end();
        }
        if self.pm10.end() > len {
            len = self.pm10.end();
        }
        len
    }

    /// Decodes a raw frame, validating its header and plausibility bound.
    pub fn decode<TIoError>(&self, frame: &[u8]) -> Result<PmValues, Error<TIoError>> {
        if !frame.starts_with(self.header) {
            return Err(Error::InvalidHeader(self.kind));
        }
        PmValues {
            pm25: self.pm25.extract(frame),
            pm10: self.pm10.extract(frame),
        }
        .check(self.kind)
    }
}
