//! Calendar day keys and the injected clock that produces them.

use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// A local calendar day, serialized as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(DayKey)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    pub fn succ(self) -> Self {
        DayKey(self.0.checked_add_days(Days::new(1)).unwrap_or(self.0))
    }
}

impl From<NaiveDate> for DayKey {
    fn from(d: NaiveDate) -> Self {
        DayKey(d)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map(DayKey)
    }
}

pub trait Clock: Send + Sync {
    fn today(&self) -> DayKey;
}

/// Wall clock in the local timezone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> DayKey {
        DayKey(Local::now().date_naive())
    }
}

/// Settable clock for tests and replays.
pub struct FixedClock {
    day: RwLock<DayKey>,
}

impl FixedClock {
    pub fn new(day: DayKey) -> Self {
        Self { day: RwLock::new(day) }
    }

    pub fn set(&self, day: DayKey) {
        match self.day.write() {
            Ok(mut guard) => *guard = day,
            Err(poisoned) => *poisoned.into_inner() = day,
        }
    }

    pub fn advance_day(&self) {
        let next = self.today().succ();
        self.set(next);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> DayKey {
        match self.day.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

pub fn current_day_key(clock: &dyn Clock) -> DayKey {
    clock.today()
}
