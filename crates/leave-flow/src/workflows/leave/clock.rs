use chrono::{DateTime, Local, NaiveDate, Utc};

/// Source of "today" for date validation and of review/application timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate;

    /// Balance year used for checks and debits.
    fn balance_year(&self) -> i32 {
        use chrono::Datelike;
        self.today().year()
    }
}

/// Wall clock. Dates follow the server's local calendar, timestamps are UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Frozen clock for tests and scripted demos.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Nine in the morning (UTC) on `day`.
    pub fn on(day: NaiveDate) -> Self {
        let now = day
            .and_hms_opt(9, 0, 0)
            .unwrap_or_default()
            .and_utc();
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }
}
