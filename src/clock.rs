use chrono::{Local, NaiveDate, NaiveTime};

/// Source of "today" for every date-relative rule in the crate. Injected so
/// the jobs and the marking path can be exercised at arbitrary dates.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    fn now_time(&self) -> NaiveTime;
}

/// Wall-clock time in the server's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now_time(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// A clock pinned to a fixed date, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl FixedClock {
    #[must_use]
    pub fn at(date: NaiveDate) -> Self {
        Self {
            date,
            time: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
    }

    fn now_time(&self) -> NaiveTime {
        self.time
    }
}
