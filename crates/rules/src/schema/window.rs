//! Time window: the wall-clock span during which an event is expected.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// A start/end wall-clock pair, no date attached. Times are interpreted in
/// the owning tenant's timezone at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Optional human label ("Morning shift").
    #[serde(default)]
    pub label: Option<String>,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            label: None,
            start,
            end,
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}
