//! Outbound Ports (Driven Ports)
//!
//! Dependencies the registry needs from its environment.

use chrono::{DateTime, Utc};

/// Source of wall-clock timestamps for created/updated fields.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests.
#[cfg(test)]
pub struct MockTimeSource {
    time: parking_lot::Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl MockTimeSource {
    pub fn new(initial: DateTime<Utc>) -> Self {
        Self {
            time: parking_lot::Mutex::new(initial),
        }
    }

    pub fn advance(&self, secs: i64) {
        let mut time = self.time.lock();
        *time += chrono::Duration::seconds(secs);
    }
}

#[cfg(test)]
impl TimeSource for MockTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.time.lock()
    }
}
