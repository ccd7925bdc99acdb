use heapless::String;
use particle_sensors::sps30::{ErrorCode, Sps30, Sps30Values, Sps30Version, INFO_LEN};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug)]
struct State {
    begin: Result<(), ErrorCode>,
    probe: Result<(), ErrorCode>,
    reset: Result<(), ErrorCode>,
    start: Result<(), ErrorCode>,
    values: VecDeque<Result<Sps30Values, ErrorCode>>,
    serial_number: Result<String<INFO_LEN>, ErrorCode>,
    product_name: Result<String<INFO_LEN>, ErrorCode>,
    version: Result<Sps30Version, ErrorCode>,
    calls: Vec<&'static str>,
    debugging: Option<bool>,
}

pub const VERSION: Sps30Version = Sps30Version {
    major: 2,
    minor: 2,
    hardware: 7,
    shdlc_major: 2,
    shdlc_minor: 0,
    driver_major: 1,
    driver_minor: 4,
};

/// A scripted SPS30 driver. Clones share the same script.
#[derive(Clone, Debug)]
pub struct Driver {
    state: Rc<RefCell<State>>,
}

fn info(text: &str) -> String<INFO_LEN> {
    let mut result = String::new();
    result.push_str(text).unwrap();
    result
}

pub fn values(mass_pm2: f32, mass_pm10: f32) -> Sps30Values {
    Sps30Values {
        mass_pm2,
        mass_pm10,
        ..Sps30Values::default()
    }
}

impl Driver {
    /// A driver where every command succeeds. Values must still be pushed.
    pub fn working() -> Driver {
        Driver {
            state: Rc::new(RefCell::new(State {
                begin: Ok(()),
                probe: Ok(()),
                reset: Ok(()),
                start: Ok(()),
                values: VecDeque::new(),
                serial_number: Ok(info("8AF3C2D19E0B4A21")),
                product_name: Ok(info("00080000")),
                version: Ok(VERSION),
                calls: Vec::new(),
                debugging: None,
            })),
        }
    }

    /// A driver where no command gets a response.
    pub fn absent() -> Driver {
        let driver = Driver::working();
        {
            let mut state = driver.state.borrow_mut();
            state.begin = Err(ErrorCode::TIMEOUT);
            state.probe = Err(ErrorCode::TIMEOUT);
            state.reset = Err(ErrorCode::TIMEOUT);
            state.start = Err(ErrorCode::TIMEOUT);
            state.serial_number = Err(ErrorCode::TIMEOUT);
            state.product_name = Err(ErrorCode::TIMEOUT);
            state.version = Err(ErrorCode::TIMEOUT);
        }
        driver
    }

    pub fn set_begin(&self, result: Result<(), ErrorCode>) {
        self.state.borrow_mut().begin = result;
    }

    pub fn set_probe(&self, result: Result<(), ErrorCode>) {
        self.state.borrow_mut().probe = result;
    }

    pub fn set_reset(&self, result: Result<(), ErrorCode>) {
        self.state.borrow_mut().reset = result;
    }

    pub fn set_start(&self, result: Result<(), ErrorCode>) {
        self.state.borrow_mut().start = result;
    }

    pub fn set_serial_number(&self, result: Result<&str, ErrorCode>) {
        self.state.borrow_mut().serial_number = result.map(info);
    }

    pub fn set_version(&self, result: Result<Sps30Version, ErrorCode>) {
        self.state.borrow_mut().version = result;
    }

    /// Queues the result of the next `get_values`. An empty queue times out.
    pub fn push_values(&self, result: Result<Sps30Values, ErrorCode>) {
        self.state.borrow_mut().values.push_back(result);
    }

    /// Every driver command received, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.borrow().calls.clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| **call == command)
            .count()
    }

    pub fn debugging(&self) -> Option<bool> {
        self.state.borrow().debugging
    }

    fn record(&self, command: &'static str) {
        self.state.borrow_mut().calls.push(command);
    }
}

impl Sps30 for Driver {
    fn begin(&mut self) -> Result<(), ErrorCode> {
        self.record("begin");
        self.state.borrow().begin
    }

    fn probe(&mut self) -> Result<(), ErrorCode> {
        self.record("probe");
        self.state.borrow().probe
    }

    fn reset(&mut self) -> Result<(), ErrorCode> {
        self.record("reset");
        self.state.borrow().reset
    }

    fn start(&mut self) -> Result<(), ErrorCode> {
        self.record("start");
        self.state.borrow().start
    }

    fn get_values(&mut self) -> Result<Sps30Values, ErrorCode> {
        self.record("get_values");
        self.state
            .borrow_mut()
            .values
            .pop_front()
            .unwrap_or(Err(ErrorCode::TIMEOUT))
    }

    fn serial_number(&mut self) -> Result<String<INFO_LEN>, ErrorCode> {
        self.record("serial_number");
        self.state.borrow().serial_number.clone()
    }

    fn product_name(&mut self) -> Result<String<INFO_LEN>, ErrorCode> {
        self.record("product_name");
        self.state.borrow().product_name.clone()
    }

    fn version(&mut self) -> Result<Sps30Version, ErrorCode> {
        self.record("version");
        self.state.borrow().version
    }

    fn set_debugging(&mut self, enabled: bool) {
        self.state.borrow_mut().debugging = Some(enabled);
    }
}
