use serde::{Deserialize, Serialize};

use crate::backend::storage::{self, KeyValueStore};
use crate::backend::utility::{yesterday_of, CalendarDay};
use crate::error::Result;

/// Persisted under `streak_data`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    #[serde(rename = "streak", default)]
    pub count: u32,
    #[serde(rename = "date", default)]
    pub last_active: Option<CalendarDay>,
}

/// What a qualifying action did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// Already counted today.
    Unchanged,
    /// Yesterday was active; the run continues.
    Extended,
    /// First action ever, or a gap of two or more days.
    Restarted,
}

impl StreakRecord {
    /// Organic path: apply one qualifying action on `today`.
    pub fn advance(self, today: CalendarDay) -> (StreakRecord, StreakChange) {
        match self.last_active {
            Some(d) if d == today => (self, StreakChange::Unchanged),
            Some(d) if d == yesterday_of(today) => (
                StreakRecord {
                    count: self.count + 1,
                    last_active: Some(today),
                },
                StreakChange::Extended,
            ),
            _ => (
                StreakRecord {
                    count: 1,
                    last_active: Some(today),
                },
                StreakChange::Restarted,
            ),
        }
    }

    /// Manual "click the flame" override. Ignores the date rules entirely:
    /// always +1 and stamps today, even when today was already counted or the
    /// run had lapsed. Kept distinct from `advance` on purpose; the two paths
    /// disagree for same-day and after-gap clicks.
    pub fn bump(self, today: CalendarDay) -> StreakRecord {
        StreakRecord {
            count: self.count + 1,
            last_active: Some(today),
        }
    }

    /// Startup reconciliation: a record last active before yesterday is dead.
    pub fn reconcile(self, today: CalendarDay) -> StreakRecord {
        match self.last_active {
            Some(d) if d == today || d == yesterday_of(today) => self,
            _ => StreakRecord {
                count: 0,
                last_active: None,
            },
        }
    }
}

/// Load the stored streak, reconciling it against `today`. A lapsed streak is
/// written back as `{0, null}`.
pub fn load_streak(store: &dyn KeyValueStore, today: CalendarDay) -> Result<StreakRecord> {
    let stored: StreakRecord = storage::read_json(store, storage::STREAK_KEY)?.unwrap_or_default();
    let reconciled = stored.reconcile(today);
    if reconciled != stored || stored.last_active.is_none() {
        if stored.count > 0 {
            tracing::info!(previous = stored.count, "streak lapsed, resetting");
        }
        save_streak(store, &reconciled)?;
    }
    Ok(reconciled)
}

pub fn save_streak(store: &dyn KeyValueStore, record: &StreakRecord) -> Result<()> {
    storage::write_json(store, storage::STREAK_KEY, record)
}
