use crate::Season;
use chrono::{DateTime, Datelike, Utc};

/// Source of wall-clock time; the season is the current calendar year.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn season(&self) -> Season {
        Season(self.now().year())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Frozen clock for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
