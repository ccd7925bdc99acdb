use particle_sensors::humidity::HumiditySensor;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Clone, Debug)]
pub struct Sensor {
    humidity: Rc<Cell<f32>>,
    temperature: Rc<Cell<f32>>,
    began: Rc<Cell<usize>>,
}

impl Sensor {
    pub fn new(humidity: f32, temperature: f32) -> Sensor {
        Sensor {
            humidity: Rc::new(Cell::new(humidity)),
            temperature: Rc::new(Cell::new(temperature)),
            began: Rc::new(Cell::new(0)),
        }
    }

    pub fn set(&self, humidity: f32, temperature: f32) {
        self.humidity.set(humidity);
        self.temperature.set(temperature);
    }

    pub fn began(&self) -> usize {
        self.began.get()
    }
}

impl HumiditySensor for Sensor {
    fn begin(&mut self) {
        self.began.set(self.began.get() + 1);
    }

    fn read_humidity(&mut self) -> f32 {
        self.humidity.get()
    }

    fn read_temperature(&mut self) -> f32 {
        self.temperature.get()
    }
}
