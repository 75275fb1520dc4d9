//! Destinations for the `log` modifier.
use log::Level;
use std::cell::RefCell;
use std::fmt::Debug;

pub trait LogSink: Debug {
    fn log(&self, level: Level, message: &str);
}

/// Forwards to the `log` facade under the `jel` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeSink;

impl LogSink for FacadeSink {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: "jel", level, "{}", message);
    }
}

/// Keeps every message, for hosts that display them and for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: RefCell<Vec<(Level, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        self.records.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records.borrow().iter().map(|(_, m)| m.clone()).collect()
    }
}

impl LogSink for RecordingSink {
    fn log(&self, level: Level, message: &str) {
        self.records.borrow_mut().push((level, message.to_string()));
    }
}
