use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::storage::{self, KeyValueStore, Ledger};
use crate::backend::utility::CalendarDay;
use crate::error::{LifeSkillsError, Result};

/// How many of the latest entries the mood journey looks at.
pub const JOURNEY_WINDOW: usize = 15;
/// Minimum entries before a reflection is requested.
pub const MIN_ENTRIES_FOR_INSIGHT: usize = 3;

pub const MOOD_LEDGER: Ledger<MoodEntry> = Ledger::new(storage::MOOD_HISTORY_KEY);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Read a one-word model reply. Anything unexpected counts as neutral.
    pub fn from_reply(reply: &str) -> Sentiment {
        match reply.trim().to_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    /// Bar height on the mood chart, in percent.
    pub fn chart_height(self) -> u8 {
        match self {
            Sentiment::Positive => 100,
            Sentiment::Neutral => 60,
            Sentiment::Negative => 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    pub emoji: Option<String>,
    #[serde(default)]
    pub text: String,
    /// The user's calendar day at check-in. Older entries lack it and fall
    /// back to the timestamp read in local time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<CalendarDay>,
    /// Attached after the fact on journey views; never written back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
}

impl MoodEntry {
    pub fn local_day(&self) -> CalendarDay {
        self.day
            .unwrap_or_else(|| self.timestamp.with_timezone(&Local).date_naive())
    }
}

pub struct EmojiCategory {
    pub name: &'static str,
    pub emojis: [&'static str; 5],
}

pub const EMOJI_PALETTE: [EmojiCategory; 6] = [
    EmojiCategory { name: "Happy", emojis: ["😊", "😄", "😂", "😍", "🥳"] },
    EmojiCategory { name: "Calm", emojis: ["😌", "🥰", "😎", "😇", "🧘"] },
    EmojiCategory { name: "Unsure", emojis: ["🤔", "😐", "🤷", "🧐", "😕"] },
    EmojiCategory { name: "Sad", emojis: ["😟", "😢", "😭", "😞", "😩"] },
    EmojiCategory { name: "Frustrated", emojis: ["😠", "😤", "😡", "🤯", "😑"] },
    EmojiCategory { name: "Tired", emojis: ["😴", "🥱", "😪", "😒", "😬"] },
];

/// True when the daily check-in has not been answered today.
pub fn check_in_due(store: &dyn KeyValueStore, today: CalendarDay) -> Result<bool> {
    let last: Option<CalendarDay> = storage::read_json(store, storage::MOOD_LAST_CHECKED_KEY)?;
    Ok(last != Some(today))
}

/// Record a check-in. An emoji is required; the note is optional and trimmed.
pub fn submit_mood(
    store: &dyn KeyValueStore,
    emoji: Option<&str>,
    text: &str,
    now: DateTime<Utc>,
    today: CalendarDay,
) -> Result<MoodEntry> {
    let emoji = emoji
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| LifeSkillsError::Validation("pick an emoji first".to_string()))?;
    let entry = MoodEntry {
        timestamp: now,
        emoji: Some(emoji.to_string()),
        text: text.trim().to_string(),
        day: Some(today),
        sentiment: None,
    };
    MOOD_LEDGER.append(store, entry.clone())?;
    storage::write_json(store, storage::MOOD_LAST_CHECKED_KEY, &today)?;
    tracing::debug!(emoji, "mood entry recorded");
    Ok(entry)
}

pub fn history(store: &dyn KeyValueStore) -> Result<Vec<MoodEntry>> {
    MOOD_LEDGER.entries(store)
}

/// The last `limit` entries, oldest first.
pub fn recent(store: &dyn KeyValueStore, limit: usize) -> Result<Vec<MoodEntry>> {
    let mut entries = MOOD_LEDGER.entries(store)?;
    let skip = entries.len().saturating_sub(limit);
    Ok(entries.split_off(skip))
}

pub fn entries_on(store: &dyn KeyValueStore, day: CalendarDay) -> Result<Vec<MoodEntry>> {
    MOOD_LEDGER.list(store, |e| e.local_day() == day)
}

/// One line per entry, as fed to the reflection prompt.
pub fn format_for_prompt(history: &[MoodEntry]) -> String {
    history
        .iter()
        .map(|e| {
            let note = if e.text.is_empty() { "none" } else { e.text.as_str() };
            format!(
                "- On {}, I felt {}. Notes: \"{}\"",
                e.local_day().format("%Y-%m-%d"),
                e.emoji.as_deref().unwrap_or("a certain way"),
                note
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
