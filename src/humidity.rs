/// A combined humidity and temperature sensor, such as an AM2320.
///
/// Reads return `f32::NAN` when the sensor does not answer.
pub trait HumiditySensor {
    /// Called once while the sensors are initialized.
    fn begin(&mut self) {}
    /// Relative humidity [%RH]
    fn read_humidity(&mut self) -> f32;
    /// Temperature [°C]
    fn read_temperature(&mut self) -> f32;
}

/// Placeholder for boards without a humidity sensor. Always reads `NAN`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHumiditySensor;

impl HumiditySensor for NoHumiditySensor {
    fn read_humidity(&mut self) -> f32 {
        f32::NAN
    }

    fn read_temperature(&mut self) -> f32 {
        f32::NAN
    }
}

/// Sensor faults read as zero.
pub(crate) fn nan_as_zero(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}
