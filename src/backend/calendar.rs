use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::backend::storage::{self, KeyValueStore, Ledger};
use crate::backend::utility::CalendarDay;
use crate::error::{LifeSkillsError, Result};

pub const CALENDAR_LEDGER: Ledger<CalendarEvent> = Ledger::new(storage::CALENDAR_EVENTS_KEY);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    School,
    Personal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: i64,
    pub date: CalendarDay,
    pub title: String,
    #[serde(rename = "type")]
    pub category: EventCategory,
}

/// School dates every new calendar starts with.
const DEFAULT_SCHOOL_EVENTS: [(i32, u32, u32, &str); 4] = [
    (2024, 9, 3, "First Day of School"),
    (2024, 10, 14, "Mid-term Exams Start"),
    (2024, 11, 28, "Thanksgiving Break"),
    (2024, 12, 20, "Winter Break Starts"),
];

pub fn default_events() -> Vec<CalendarEvent> {
    DEFAULT_SCHOOL_EVENTS
        .iter()
        .zip(1i64..)
        .filter_map(|(&(y, m, d, title), id)| {
            NaiveDate::from_ymd_opt(y, m, d).map(|date| CalendarEvent {
                id,
                date,
                title: title.to_string(),
                category: EventCategory::School,
            })
        })
        .collect()
}

/// All events, seeding the defaults the first time the calendar is opened.
pub fn load_events(store: &dyn KeyValueStore) -> Result<Vec<CalendarEvent>> {
    match CALENDAR_LEDGER.load(store)? {
        Some(events) => Ok(events),
        None => {
            let seeded = default_events();
            CALENDAR_LEDGER.seed(store, &seeded)?;
            tracing::debug!(count = seeded.len(), "seeded default calendar");
            Ok(seeded)
        }
    }
}

/// Add a personal event. Ids are one past the largest id in the ledger.
pub fn add_event(store: &dyn KeyValueStore, date: CalendarDay, title: &str) -> Result<CalendarEvent> {
    let title = title.trim();
    if title.is_empty() {
        return Err(LifeSkillsError::Validation("event title is empty".to_string()));
    }
    let existing = load_events(store)?;
    let id = existing.iter().map(|e| e.id).max().unwrap_or(0) + 1;
    let event = CalendarEvent {
        id,
        date,
        title: title.to_string(),
        category: EventCategory::Personal,
    };
    CALENDAR_LEDGER.append(store, event.clone())?;
    Ok(event)
}

pub fn events_on(store: &dyn KeyValueStore, day: CalendarDay) -> Result<Vec<CalendarEvent>> {
    load_events(store)?;
    CALENDAR_LEDGER.list(store, |e| e.date == day)
}

/// Events between `start` and `end`, both inclusive, ordered by date.
pub fn events_in_range(
    store: &dyn KeyValueStore,
    start: CalendarDay,
    end: CalendarDay,
) -> Result<Vec<CalendarEvent>> {
    load_events(store)?;
    let mut out = CALENDAR_LEDGER.list(store, |e| e.date >= start && e.date <= end)?;
    out.sort_by_key(|e| (e.date, e.id));
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub day: u32,
    pub date: CalendarDay,
    pub events: Vec<CalendarEvent>,
}

/// One month laid out Sunday-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    /// Empty cells before the 1st.
    pub leading_blanks: u32,
    pub days: Vec<DayCell>,
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

pub fn month_view(store: &dyn KeyValueStore, year: i32, month: u32) -> Result<MonthView> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| LifeSkillsError::Validation(format!("no such month {year}-{month}")))?;
    let events = load_events(store)?;
    let days = (1..=days_in_month(year, month))
        .filter_map(|d| NaiveDate::from_ymd_opt(year, month, d))
        .map(|date| DayCell {
            day: date.day(),
            date,
            events: events.iter().filter(|e| e.date == date).cloned().collect(),
        })
        .collect();
    Ok(MonthView {
        year,
        month,
        leading_blanks: first.weekday().num_days_from_sunday(),
        days,
    })
}

/// Month before / after, for prev/next navigation.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), (index.rem_euclid(12) + 1) as u32)
}
