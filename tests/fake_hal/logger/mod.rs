use log::{LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;

thread_local! {
    static LINES: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

/// Formats every record, keeping the lines of each test thread apart.
struct Recorder;

impl Log for Recorder {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let line = record.args().to_string();
        LINES.with(|lines| lines.borrow_mut().push(line));
    }

    fn flush(&self) {}
}

static RECORDER: Recorder = Recorder;

/// Installs the recorder at trace level. Safe to call from every test.
pub fn install() {
    let _ = log::set_logger(&RECORDER);
    log::set_max_level(LevelFilter::Trace);
}

/// Lines logged on this thread since the last call.
pub fn take_lines() -> Vec<String> {
    LINES.with(|lines| lines.borrow_mut().drain(..).collect())
}
