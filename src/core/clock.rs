use chrono::{Local, NaiveDateTime, Timelike};

/// Clock abstracts access to the current timestamp so the facade remains
/// deterministic in tests.
pub trait Clock: Send + Sync {
    /// Returns the current local date and time, truncated to whole seconds.
    fn now(&self) -> NaiveDateTime;
}

/// Real-time clock backed by the local system time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        let now = Local::now().naive_local();
        now.with_nanosecond(0).unwrap_or(now)
    }
}
