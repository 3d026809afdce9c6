//! The explicit app context: who is logged in plus streak and goal state,
//! hydrated from the store on start and torn down on logout.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::calendar::{self, CalendarEvent};
use crate::backend::challenge::{ChallengeResult, TimeChallenge};
use crate::backend::content::VolunteerActivity;
use crate::backend::goals::{self, DailyGoal};
use crate::backend::journals::{self, MoodEntry};
use crate::backend::storage::{self, KeyValueStore};
use crate::backend::streaks::{self, StreakChange, StreakRecord};
use crate::backend::unlocks::{self, Feature};
use crate::backend::utility::{CalendarDay, Clock};
use crate::error::{LifeSkillsError, Result};

pub const DEFAULT_DISPLAY_NAME: &str = "Explorer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
}

/// Things that count toward the streak and complete the daily goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualifyingAction {
    ReadStory,
    CompletedChallenge,
    AddedCalendarEvent,
    SubmittedMood,
    OpenedVolunteerLink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionOutcome {
    pub streak: StreakRecord,
    pub streak_change: StreakChange,
    /// Today's goal flipped to completed by this action.
    pub goal_completed: bool,
    /// Ask the user for tomorrow's goal. Only ever set alongside `goal_completed`.
    pub prompt_next_goal: bool,
}

pub struct LifeSkillsContext {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    user: Option<User>,
    streak: StreakRecord,
    goal: Option<DailyGoal>,
}

impl LifeSkillsContext {
    /// Read user, streak and goal from the store, reconciling against today.
    pub fn hydrate(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Result<Self> {
        let today = clock.today();
        let user = storage::read_json::<User>(store.as_ref(), storage::USER_KEY)?
            .filter(|u| !u.name.trim().is_empty());
        let streak = streaks::load_streak(store.as_ref(), today)?;
        let goal = goals::load_goal(store.as_ref(), today)?;
        tracing::debug!(user = ?user.as_ref().map(|u| &u.name), streak = streak.count, "context hydrated");
        Ok(Self {
            store,
            clock,
            user,
            streak,
            goal,
        })
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn today(&self) -> CalendarDay {
        self.clock.today()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.name.as_str())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }

    /// Name-only login. No credentials are checked.
    pub fn login(&mut self, name: &str) -> Result<&User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LifeSkillsError::Validation("name is empty".to_string()));
        }
        let user = User {
            name: name.to_string(),
        };
        storage::write_json(self.store(), storage::USER_KEY, &user)?;
        tracing::info!(user = %user.name, "logged in");
        Ok(self.user.insert(user))
    }

    /// Clear every persisted key and reset in-memory state.
    pub fn logout(&mut self) -> Result<()> {
        let res = storage::clear_all(self.store());
        self.user = None;
        self.streak = StreakRecord::default();
        self.goal = None;
        tracing::info!("logged out, local data cleared");
        res
    }

    pub fn streak(&self) -> StreakRecord {
        self.streak
    }

    /// The stored goal: today's, or tomorrow's once today's is done.
    pub fn goal(&self) -> Option<&DailyGoal> {
        self.goal.as_ref()
    }

    pub fn unlocked_features(&self) -> BTreeSet<Feature> {
        unlocks::unlocked_features(self.streak.count)
    }

    fn roll_over(&mut self, today: CalendarDay) -> Result<()> {
        if self.goal.as_ref().is_some_and(|g| g.date < today) {
            self.goal = None;
            self.store.remove(storage::DAILY_GOAL_KEY)?;
        }
        Ok(())
    }

    /// Organic streak update plus goal completion for one qualifying action.
    pub fn record_action(&mut self, action: QualifyingAction) -> Result<ActionOutcome> {
        let today = self.today();
        self.roll_over(today)?;

        let (streak, streak_change) = self.streak.advance(today);
        if streak_change != StreakChange::Unchanged {
            streaks::save_streak(self.store(), &streak)?;
            tracing::info!(?action, count = streak.count, ?streak_change, "streak updated");
        }
        self.streak = streak;

        let mut goal_completed = false;
        if let Some(goal) = self.goal.as_mut() {
            if goals::complete_if_open(goal, today) {
                goal_completed = true;
                goals::save_goal(self.store.as_ref(), goal)?;
                tracing::info!(goal = %goal.text, "daily goal completed");
            }
        }

        Ok(ActionOutcome {
            streak,
            streak_change,
            goal_completed,
            prompt_next_goal: goal_completed,
        })
    }

    /// Manual flame click. See [`StreakRecord::bump`] for how it differs.
    pub fn bump_streak(&mut self) -> Result<StreakRecord> {
        let bumped = self.streak.bump(self.today());
        streaks::save_streak(self.store(), &bumped)?;
        self.streak = bumped;
        Ok(bumped)
    }

    pub fn set_goal(&mut self, text: &str) -> Result<DailyGoal> {
        let today = self.today();
        self.roll_over(today)?;
        let goal = goals::plan_goal(self.goal.as_ref(), text, today)?;
        goals::save_goal(self.store(), &goal)?;
        tracing::debug!(goal = %goal.text, date = %goal.date, "goal set");
        self.goal = Some(goal.clone());
        Ok(goal)
    }

    pub fn mood_check_in_due(&self) -> Result<bool> {
        journals::check_in_due(self.store(), self.today())
    }

    pub fn submit_mood(&mut self, emoji: Option<&str>, text: &str) -> Result<(MoodEntry, ActionOutcome)> {
        let entry = journals::submit_mood(
            self.store.as_ref(),
            emoji,
            text,
            self.clock.now(),
            self.clock.today(),
        )?;
        let outcome = self.record_action(QualifyingAction::SubmittedMood)?;
        Ok((entry, outcome))
    }

    pub fn add_calendar_event(
        &mut self,
        date: CalendarDay,
        title: &str,
    ) -> Result<(CalendarEvent, ActionOutcome)> {
        let event = calendar::add_event(self.store(), date, title)?;
        let outcome = self.record_action(QualifyingAction::AddedCalendarEvent)?;
        Ok((event, outcome))
    }

    /// Count a finished time challenge.
    pub fn complete_challenge(&mut self, result: &ChallengeResult) -> Result<ActionOutcome> {
        tracing::debug!(
            task = %result.task.name,
            seconds_used = result.seconds_used,
            finished_early = result.finished_early,
            "challenge completed"
        );
        self.record_action(QualifyingAction::CompletedChallenge)
    }

    /// One countdown second. Counts the challenge the moment the clock runs out.
    pub fn tick_challenge(
        &mut self,
        challenge: &mut TimeChallenge,
    ) -> Result<Option<(ChallengeResult, ActionOutcome)>> {
        match challenge.tick() {
            Some(result) => {
                let outcome = self.complete_challenge(&result)?;
                Ok(Some((result, outcome)))
            }
            None => Ok(None),
        }
    }

    /// The "I'm done" button. A challenge that already finished is not counted again.
    pub fn finish_challenge(
        &mut self,
        challenge: &mut TimeChallenge,
    ) -> Result<Option<(ChallengeResult, ActionOutcome)>> {
        match challenge.finish() {
            Some(result) => {
                let outcome = self.complete_challenge(&result)?;
                Ok(Some((result, outcome)))
            }
            None => Ok(None),
        }
    }

    /// Follow an activity's registration link. Returns the link to open;
    /// activities without one cannot be opened and do not count.
    pub fn open_volunteer_link(
        &mut self,
        activity: &VolunteerActivity,
    ) -> Result<(String, ActionOutcome)> {
        let link = activity.registration_link.clone().ok_or_else(|| {
            LifeSkillsError::Validation(format!("{} has no registration link", activity.title))
        })?;
        let outcome = self.record_action(QualifyingAction::OpenedVolunteerLink)?;
        Ok((link, outcome))
    }
}
