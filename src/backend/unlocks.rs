use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Modules gated behind a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    TimeChallenge,
    Calendar,
    Circles,
}

impl Feature {
    pub const ALL: [Feature; 3] = [Feature::TimeChallenge, Feature::Calendar, Feature::Circles];

    /// Minimum streak that reveals the feature.
    pub const fn threshold(self) -> u32 {
        match self {
            Feature::TimeChallenge => 3,
            Feature::Calendar => 5,
            Feature::Circles => 7,
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Feature::TimeChallenge => "Time Master Challenge",
            Feature::Calendar => "Calendar",
            Feature::Circles => "Circles",
        }
    }

    /// Hint shown on the locked card.
    pub fn requirement(self) -> String {
        format!("Reach a {}-day streak!", self.threshold())
    }
}

/// Features unlocked at the given streak. Derived on every call, never stored.
pub fn unlocked_features(streak_count: u32) -> BTreeSet<Feature> {
    Feature::ALL
        .into_iter()
        .filter(|f| streak_count >= f.threshold())
        .collect()
}

pub fn is_unlocked(feature: Feature, streak_count: u32) -> bool {
    streak_count >= feature.threshold()
}
