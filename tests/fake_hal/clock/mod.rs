use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// A millisecond clock that only moves when told to.
#[derive(Clone, Debug, Default)]
pub struct Clock {
    now_ms: Rc<Cell<u64>>,
}

impl Clock {
    pub fn new() -> Clock {
        Clock::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.now_ms
            .set(self.now_ms.get() + duration.as_millis() as u64);
    }

    pub fn time_fn(&self) -> impl Fn() -> u64 {
        let now_ms = self.now_ms.clone();
        move || now_ms.get()
    }

    pub fn elapsed_since_fn(&self) -> impl Fn(u64) -> Duration {
        let now_ms = self.now_ms.clone();
        move |since| Duration::from_millis(now_ms.get() - since)
    }
}
