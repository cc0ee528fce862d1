use chrono::NaiveDate;

/// The current day on the device's local calendar (not a UTC-shifted day),
/// so "today" matches the user's wall clock.
pub fn today_local() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// A day-rollover transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rollover {
    pub previous: NaiveDate,
    pub current: NaiveDate,
}

/// Caches the current day and detects midnight rollover. `check` is safe to
/// call on any cadence: it reports each transition exactly once and is a
/// no-op while the day is unchanged.
#[derive(Debug, Clone, Copy)]
pub struct DayWatch {
    today: NaiveDate,
}

impl DayWatch {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Compare against a freshly resolved day. The cache is updated before
    /// the rollover is reported, so observers reading `today()` during the
    /// signal already see the new value.
    pub fn check(&mut self, now: NaiveDate) -> Option<Rollover> {
        if now == self.today {
            return None;
        }
        let previous = self.today;
        self.today = now;
        Some(Rollover { previous, current: now })
    }
}
