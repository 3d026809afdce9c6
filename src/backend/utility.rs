use chrono::{DateTime, Duration, Local, NaiveDate, Utc};

/// A calendar day in the user's local timezone. Streak and goal comparisons
/// only ever look at this value, never at wall-clock strings.
pub type CalendarDay = NaiveDate;

/// Source of "now". Injected so day boundaries are testable.
pub trait Clock: Send + Sync {
    /// Current instant, used for journal timestamps.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar day in the clock's timezone.
    fn today(&self) -> CalendarDay;
}

/// Wall clock in the machine's local timezone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> CalendarDay {
        Local::now().date_naive()
    }
}

/// Clock pinned to a given day; `advance_days` moves it forward.
#[derive(Debug)]
pub struct FixedClock {
    day: parking_lot::Mutex<CalendarDay>,
}

impl FixedClock {
    pub fn new(day: CalendarDay) -> Self {
        Self {
            day: parking_lot::Mutex::new(day),
        }
    }

    pub fn set(&self, day: CalendarDay) {
        *self.day.lock() = day;
    }

    pub fn advance_days(&self, days: i64) {
        let mut d = self.day.lock();
        *d += Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let day = *self.day.lock();
        day.and_hms_opt(12, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now)
    }

    fn today(&self) -> CalendarDay {
        *self.day.lock()
    }
}

pub fn yesterday_of(day: CalendarDay) -> CalendarDay {
    day - Duration::days(1)
}

pub fn tomorrow_of(day: CalendarDay) -> CalendarDay {
    day + Duration::days(1)
}

/// Parse `YYYY-MM-DD`, also accepting RFC3339 timestamps.
pub fn parse_day(s: &str) -> Option<CalendarDay> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    None
}
