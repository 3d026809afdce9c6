use serde::Serialize;

use crate::backend::circles::{CommunicationChallenge, COMMUNICATION_CHALLENGES};
use crate::backend::goals::{DailyGoal, GOAL_SUGGESTIONS};
use crate::backend::session::LifeSkillsContext;
use crate::backend::storage::{self, KeyValueStore};
use crate::backend::unlocks::{self, Feature};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureCard {
    pub feature: Feature,
    pub title: &'static str,
    pub unlocked: bool,
    /// Set on locked cards only.
    pub requirement: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub date: String,
    pub display_name: String,
    pub streak: u32,
    pub goal: Option<DailyGoal>,
    pub goal_progress: u8,
    /// No goal stored; show the picker.
    pub needs_goal: bool,
    pub goal_suggestions: Vec<&'static str>,
    pub features: Vec<FeatureCard>,
    pub show_welcome: bool,
    pub mood_check_in_due: bool,
    pub communication_challenges: Vec<CommunicationChallenge>,
}

pub fn feature_cards(streak_count: u32) -> Vec<FeatureCard> {
    Feature::ALL
        .into_iter()
        .map(|feature| {
            let unlocked = unlocks::is_unlocked(feature, streak_count);
            FeatureCard {
                feature,
                title: feature.title(),
                unlocked,
                requirement: (!unlocked).then(|| feature.requirement()),
            }
        })
        .collect()
}

/// True on the very first dashboard load; records the visit so later loads
/// return false.
pub fn take_first_visit(store: &dyn KeyValueStore) -> Result<bool> {
    if store.get(storage::HAS_VISITED_KEY)?.is_some() {
        return Ok(false);
    }
    store.set(storage::HAS_VISITED_KEY, "true")?;
    Ok(true)
}

pub fn get_dashboard_summary(ctx: &LifeSkillsContext) -> Result<DashboardSummary> {
    let today = ctx.today();
    let streak = ctx.streak().count;
    let goal = ctx.goal().cloned();
    // A goal dated after today only exists once today's was completed.
    let goal_progress = match &goal {
        Some(g) if g.is_active_on(today) => g.progress_percent(),
        Some(_) => 100,
        None => 0,
    };
    let needs_goal = goal.is_none();

    Ok(DashboardSummary {
        date: today.to_string(),
        display_name: ctx.display_name().to_string(),
        streak,
        goal,
        goal_progress,
        needs_goal,
        goal_suggestions: GOAL_SUGGESTIONS.to_vec(),
        features: feature_cards(streak),
        show_welcome: take_first_visit(ctx.store())?,
        mood_check_in_due: ctx.mood_check_in_due()?,
        communication_challenges: COMMUNICATION_CHALLENGES.to_vec(),
    })
}
