//! Strictly increasing timestamps.

use chrono::{Duration, Utc};

use crate::types::Timestamp;

/// Wall clock that never returns the same instant twice.
///
/// Two calls within the clock's resolution would otherwise produce equal
/// timestamps, and "more recent than" comparisons would lose entries.
#[derive(Debug, Clone, Default)]
pub struct MonotonicClock {
    last: Option<Timestamp>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current time, bumped by one microsecond past the previous
    /// reading when the wall clock has not moved on.
    pub fn now(&mut self) -> Timestamp {
        let wall = Utc::now();
        let now = match self.last {
            Some(last) if wall <= last => last + Duration::microseconds(1),
            _ => wall,
        };
        self.last = Some(now);
        now
    }
}
