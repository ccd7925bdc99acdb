use embedded_hal::delay::DelayNs;
use std::cell::RefCell;
use std::rc::Rc;

/// Records every wait instead of sleeping. Clones share the same record.
#[derive(Clone, Debug, Default)]
pub struct Delay {
    waits_ns: Rc<RefCell<Vec<u64>>>,
}

impl Delay {
    pub fn new() -> Delay {
        Delay::default()
    }

    /// Every wait, rounded down to whole milliseconds.
    pub fn waits_ms(&self) -> Vec<u64> {
        self.waits_ns
            .borrow()
            .iter()
            .map(|ns| ns / 1_000_000)
            .collect()
    }

    pub fn total_ms(&self) -> u64 {
        self.waits_ns.borrow().iter().sum::<u64>() / 1_000_000
    }
}

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        self.waits_ns.borrow_mut().push(ns as u64);
    }

    fn delay_us(&mut self, us: u32) {
        self.waits_ns.borrow_mut().push(us as u64 * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.waits_ns.borrow_mut().push(ms as u64 * 1_000_000);
    }
}
