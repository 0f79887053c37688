use chrono::{DateTime, Utc};

/// Source of wall-clock time for audit fields
#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
