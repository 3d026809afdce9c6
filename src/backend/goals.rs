use serde::{Deserialize, Serialize};

use crate::backend::storage::{self, KeyValueStore};
use crate::backend::utility::{tomorrow_of, CalendarDay};
use crate::error::{LifeSkillsError, Result};

/// Ready-made goals offered by the goal picker.
pub const GOAL_SUGGESTIONS: [&str; 5] = [
    "Read one story",
    "Complete a Time Master Challenge",
    "Add an event to my calendar",
    "Share how I feel in the mood checker",
    "Learn about one volunteer opportunity",
];

/// Persisted under `daily_goal`. `date` is the day the goal is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyGoal {
    pub text: String,
    pub completed: bool,
    pub date: CalendarDay,
}

impl DailyGoal {
    pub fn is_active_on(&self, day: CalendarDay) -> bool {
        self.date == day
    }

    /// 0 or 100; a goal is a single step.
    pub fn progress_percent(&self) -> u8 {
        if self.completed {
            100
        } else {
            0
        }
    }
}

/// Load the stored goal, dropping anything dated before `today`.
pub fn load_goal(store: &dyn KeyValueStore, today: CalendarDay) -> Result<Option<DailyGoal>> {
    let goal: Option<DailyGoal> = storage::read_json(store, storage::DAILY_GOAL_KEY)?;
    match goal {
        Some(g) if g.date >= today => Ok(Some(g)),
        Some(_) | None => {
            store.remove(storage::DAILY_GOAL_KEY)?;
            Ok(None)
        }
    }
}

/// Decide the goal a user's choice produces.
///
/// While today's goal is completed it stays frozen, so a new choice becomes
/// tomorrow's goal. A stored goal dated after today means today's is already
/// done, so re-picking keeps targeting tomorrow. Otherwise the choice
/// replaces (or creates) today's goal.
pub fn plan_goal(
    current: Option<&DailyGoal>,
    text: &str,
    today: CalendarDay,
) -> Result<DailyGoal> {
    let text = text.trim();
    if text.is_empty() {
        return Err(LifeSkillsError::Validation("goal text is empty".to_string()));
    }
    let date = match current {
        Some(g) if g.date > today || (g.is_active_on(today) && g.completed) => {
            tomorrow_of(today)
        }
        _ => today,
    };
    Ok(DailyGoal {
        text: text.to_string(),
        completed: false,
        date,
    })
}

pub fn save_goal(store: &dyn KeyValueStore, goal: &DailyGoal) -> Result<()> {
    storage::write_json(store, storage::DAILY_GOAL_KEY, goal)
}

/// Mark today's goal complete if it is still open. Returns true only on the
/// transition, so the "set tomorrow's goal" prompt fires once.
pub fn complete_if_open(goal: &mut DailyGoal, today: CalendarDay) -> bool {
    if goal.is_active_on(today) && !goal.completed {
        goal.completed = true;
        true
    } else {
        false
    }
}
