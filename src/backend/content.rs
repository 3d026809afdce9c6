//! Content provider facade.
//!
//! Every public operation talks to the generative backend and, on any failure
//! (transport, status, timeout, unparseable or unsafe reply), returns fixed
//! fallback content instead. Callers never see an error from here.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::backend::ai_provider::{
    self, ContentBackend, GenerationRequest, GenerationResponse, PlaceReference,
};
use crate::backend::geolocation::Coordinates;
use crate::backend::journals::{self, MoodEntry, Sentiment};
use crate::backend::safety;
use crate::config::GeminiConfig;
use crate::error::ContentError;

pub const LIFE_SKILLS: [&str; 7] = [
    "time management",
    "emotional intelligence",
    "financial literacy",
    "effective communication",
    "healthy habits",
    "problem-solving",
    "critical thinking",
];

pub const DEFAULT_NGO: &str = "Local Organization";
pub const DEFAULT_ACTIVITY_EMOJI: &str = "💖";
/// Shown before any registration link is opened.
pub const GUARDIAN_NOTICE: &str = "Volunteering is awesome, but safety comes first. Make sure you have your parent or guardian's permission before you register or visit.";
pub const DEFAULT_VOLUNTEER_SUMMARY: &str = "Volunteering is a fantastic way to make new friends, learn new skills, and make a real difference in your community. Here are a few ideas to get you started!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    pub content: String,
    pub skill: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskCategory {
    Home,
    Academic,
    Personal,
}

impl TaskCategory {
    pub fn parse(s: &str) -> Option<TaskCategory> {
        match s.trim().to_lowercase().as_str() {
            "home" => Some(TaskCategory::Home),
            "academic" => Some(TaskCategory::Academic),
            "personal" => Some(TaskCategory::Personal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTask {
    pub name: String,
    pub category: TaskCategory,
    pub emoji: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerActivity {
    pub title: String,
    pub description: String,
    pub ngo: String,
    /// None when the place has no known page.
    pub registration_link: Option<String>,
    pub emoji: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerReport {
    pub summary: String,
    pub activities: Vec<VolunteerActivity>,
}

/// Mood journey view: recent entries with sentiment attached, plus an
/// optional reflection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodJourney {
    pub entries: Vec<MoodEntry>,
    pub insight: Option<String>,
}

pub fn fallback_story() -> Story {
    Story {
        title: "The Missing Homework Mystery".to_string(),
        skill: "Problem-Solving".to_string(),
        content: "Leo couldn't find his math homework anywhere! Instead of panicking, he took a deep breath. First, he retraced his steps from school. Then, he checked his backpack, his desk, and even the kitchen table. Finally, he found it tucked inside his science textbook. By thinking through the problem step-by-step, Leo solved his own mystery and learned that a calm approach is the best way to tackle any challenge.".to_string(),
    }
}

pub fn fallback_volunteer_report() -> VolunteerReport {
    let activity = |title: &str, description: &str, ngo: &str, emoji: &str| VolunteerActivity {
        title: title.to_string(),
        description: description.to_string(),
        ngo: ngo.to_string(),
        registration_link: None,
        emoji: emoji.to_string(),
    };
    VolunteerReport {
        summary: "It looks like our map had a little glitch! No worries, here are some classic ideas for being a community hero. You can look for similar places in your own neighborhood!".to_string(),
        activities: vec![
            activity("Local Park Cleanup", "Help make our local park sparkle by picking up litter and planting new flowers.", "Green Thumbs Org", "🌳"),
            activity("Animal Shelter Helper", "Help care for cats and dogs waiting for their forever homes. Playtime included!", "Paws & Whiskers", "🐶"),
            activity("Library Book Shelver", "Visit your local library and help organize books for other kids to enjoy.", "Community Reads", "📖"),
        ],
    }
}

pub fn fallback_time_tasks() -> Vec<TimeTask> {
    use TaskCategory::*;
    [
        ("Organize your backpack", Academic, "🎒"),
        ("Tidy up your desk", Academic, "💻"),
        ("Make your bed", Home, "🛏️"),
        ("Help with dinner prep", Home, "🥕"),
        ("Read a chapter of a book", Personal, "📚"),
        ("Practice an instrument for 15 mins", Personal, "🎸"),
        ("Empty the dishwasher", Home, "🍽️"),
        ("Plan your outfit for tomorrow", Personal, "👕"),
    ]
    .into_iter()
    .map(|(name, category, emoji)| TimeTask {
        name: name.to_string(),
        category,
        emoji: emoji.to_string(),
    })
    .collect()
}

pub const FALLBACK_MOOD_INSIGHT: &str = "It looks like there was a small glitch analyzing your mood journey. No worries! The most important thing is that you're checking in with yourself. Keep it up!";

static CODE_FENCE_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*(.*?)\s*```$").ok());

/// Models sometimes wrap JSON in a markdown fence even when asked not to.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    CODE_FENCE_RE
        .as_ref()
        .and_then(|re| re.captures(trimmed))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed)
}

fn split_activity_line(line: &str) -> Option<(String, String, String)> {
    let parts: Vec<&str> = line.split('|').collect();
    match parts.as_slice() {
        [emoji, name, description] => Some((
            emoji.trim().to_string(),
            name.trim().to_string(),
            description.trim().to_string(),
        )),
        _ => None,
    }
}

/// Turn a free-text reply with `emoji|name|description` lines plus cited map
/// places into a summary and activity list.
///
/// Each cited place is matched to the first line mentioning its name
/// (case-insensitive). With no cited places, activities come straight from
/// the well-formed lines.
pub fn parse_volunteer_response(text: &str, places: &[PlaceReference]) -> VolunteerReport {
    let activity_lines: Vec<&str> = text.lines().filter(|l| l.contains('|')).collect();

    let prefix = match activity_lines.first() {
        Some(first) => text.find(first).map(|i| &text[..i]).unwrap_or(text),
        None => text,
    };
    let summary = match prefix.trim() {
        "" => DEFAULT_VOLUNTEER_SUMMARY.to_string(),
        s => s.to_string(),
    };

    let mut activities: Vec<VolunteerActivity> = places
        .iter()
        .map(|place| {
            let needle = place.title.to_lowercase();
            let matched = activity_lines
                .iter()
                .find(|l| l.to_lowercase().contains(&needle))
                .and_then(|l| split_activity_line(l));
            let (emoji, description) = match matched {
                Some((emoji, _, description)) => (emoji, description),
                None => (
                    DEFAULT_ACTIVITY_EMOJI.to_string(),
                    format!("Learn more about {} and how you can help!", place.title),
                ),
            };
            VolunteerActivity {
                title: place.title.clone(),
                description,
                ngo: DEFAULT_NGO.to_string(),
                registration_link: Some(place.uri.clone()).filter(|u| !u.is_empty()),
                emoji,
            }
        })
        .collect();

    if activities.is_empty() {
        activities = activity_lines
            .iter()
            .filter_map(|l| split_activity_line(l))
            .map(|(emoji, title, description)| VolunteerActivity {
                title,
                description,
                ngo: DEFAULT_NGO.to_string(),
                registration_link: None,
                emoji,
            })
            .collect();
    }

    VolunteerReport { summary, activities }
}

#[derive(Deserialize)]
struct RawTask {
    name: String,
    category: String,
    emoji: String,
}

pub fn parse_time_tasks(text: &str) -> Result<Vec<TimeTask>, ContentError> {
    let raw: Vec<RawTask> = serde_json::from_str(strip_code_fence(text))?;
    let tasks: Vec<TimeTask> = raw
        .into_iter()
        .filter_map(|t| {
            let category = TaskCategory::parse(&t.category)?;
            let name = t.name.trim();
            if name.is_empty() {
                return None;
            }
            Some(TimeTask {
                name: name.to_string(),
                category,
                emoji: t.emoji.trim().to_string(),
            })
        })
        .collect();
    if tasks.is_empty() {
        return Err(ContentError::Malformed("no usable tasks".to_string()));
    }
    Ok(tasks)
}

pub fn parse_story(text: &str) -> Result<Story, ContentError> {
    let story: Story = serde_json::from_str(strip_code_fence(text))?;
    if story.title.trim().is_empty() || story.content.trim().is_empty() {
        return Err(ContentError::Malformed("story missing title or content".to_string()));
    }
    safety::policy_check(&story.title).map_err(ContentError::PolicyViolation)?;
    safety::policy_check(&story.content).map_err(ContentError::PolicyViolation)?;
    Ok(Story {
        title: story.title.trim().to_string(),
        content: safety::redact_pii(story.content.trim()),
        skill: story.skill.trim().to_string(),
    })
}

pub struct ContentService {
    backend: Arc<dyn ContentBackend>,
    fast_model: String,
    reflective_model: String,
    timeout: Duration,
}

impl ContentService {
    pub fn new(backend: Arc<dyn ContentBackend>, config: &GeminiConfig) -> Self {
        Self {
            backend,
            fast_model: config.fast_model.clone(),
            reflective_model: config.reflective_model.clone(),
            timeout: ai_provider::retry_budget(config),
        }
    }

    /// How long one operation may run before falling back.
    pub fn deadline(&self) -> Duration {
        self.timeout
    }

    /// Override the per-operation deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn call(&self, request: GenerationRequest) -> Result<GenerationResponse, ContentError> {
        match tokio::time::timeout(self.timeout, self.backend.generate(request)).await {
            Ok(res) => res,
            Err(_) => Err(ContentError::Timeout(self.timeout.as_secs())),
        }
    }

    /// A short story starring `username` about a randomly chosen life skill.
    pub async fn fetch_story(&self, username: &str) -> Story {
        let skill = LIFE_SKILLS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(LIFE_SKILLS[0]);
        self.fetch_story_about(username, skill).await
    }

    pub async fn fetch_story_about(&self, username: &str, skill: &str) -> Story {
        match self.try_story(username, skill).await {
            Ok(story) => story,
            Err(e) => {
                tracing::warn!(error = %e, "story generation failed, using fallback");
                fallback_story()
            }
        }
    }

    async fn try_story(&self, username: &str, skill: &str) -> Result<Story, ContentError> {
        let prompt = format!(
            "Create a short, engaging, and inspiring story for a 12-year-old named {username} about the importance of {skill}. Make {username} the main character, who is a curious and resourceful kid. The story should be easy to read, have a clear moral, and feature relatable situations. Format the response as a JSON object with keys \"title\", \"content\" (the story text), and \"skill\" (the life skill covered)."
        );
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "content": { "type": "STRING" },
                "skill": { "type": "STRING" },
            },
            "required": ["title", "content", "skill"],
        });
        let res = self
            .call(GenerationRequest::json(&self.fast_model, prompt, schema))
            .await?;
        parse_story(&res.text)
    }

    /// Kid-friendly volunteering places near `at`.
    pub async fn fetch_volunteer_activities(&self, at: Coordinates) -> VolunteerReport {
        match self.try_volunteer_activities(at).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "volunteer lookup failed, using fallback");
                fallback_volunteer_report()
            }
        }
    }

    async fn try_volunteer_activities(&self, at: Coordinates) -> Result<VolunteerReport, ContentError> {
        let prompt = "You are a friendly guide for a 12-year-old looking for volunteer opportunities.
Based on my location, find 3-5 local, kid-friendly places to volunteer. Ideas include animal shelters, park cleanups, community gardens, or libraries.

First, write a short, encouraging summary of why volunteering is great.

Then, for each place found via Google Maps, provide the following on a new line, separated by a pipe (|):
- A fun emoji
- The name of the place
- A short, one-sentence description of a fun activity a kid could do there.

Example format for each place:
🌳|Greenwood Park|Help keep the park beautiful by planting flowers and picking up litter.
🐶|Happy Paws Shelter|Spend time playing with cats and dogs to help them feel loved.";
        let res = self
            .call(GenerationRequest::grounded(&self.fast_model, prompt, at))
            .await?;
        let report = parse_volunteer_response(&res.text, &res.places);
        if report.activities.is_empty() {
            return Err(ContentError::Malformed("no activities in reply".to_string()));
        }
        Ok(report)
    }

    pub async fn fetch_time_management_tasks(&self) -> Vec<TimeTask> {
        match self.try_time_tasks().await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(error = %e, "task generation failed, using fallback");
                fallback_time_tasks()
            }
        }
    }

    async fn try_time_tasks(&self) -> Result<Vec<TimeTask>, ContentError> {
        let prompt = "Generate a list of 8 simple, age-appropriate tasks for 11-14 year olds focused on time management. Categorize them as 'Home', 'Academic', or 'Personal'. Provide a name, category, and a relevant emoji for each. Format the response as a valid JSON array of objects.";
        let schema = json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "name": { "type": "STRING" },
                    "category": { "type": "STRING" },
                    "emoji": { "type": "STRING" },
                },
                "required": ["name", "category", "emoji"],
            },
        });
        let res = self
            .call(GenerationRequest::json(&self.fast_model, prompt, schema))
            .await?;
        parse_time_tasks(&res.text)
    }

    /// A short, encouraging reflection over the given entries.
    pub async fn fetch_mood_insight(&self, history: &[MoodEntry]) -> String {
        match self.try_mood_insight(history).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "mood insight failed, using fallback");
                FALLBACK_MOOD_INSIGHT.to_string()
            }
        }
    }

    async fn try_mood_insight(&self, history: &[MoodEntry]) -> Result<String, ContentError> {
        let prompt = format!(
            "You are a friendly and encouraging wellness coach for a 12-year-old. Analyze the following mood journal entries and provide a short (under 80 words), positive, and insightful summary. Your tone should be like a cool, supportive older sibling, not a doctor. Point out any patterns in a gentle way and offer one simple, actionable tip for well-being. Here are the entries:\n{}",
            journals::format_for_prompt(history)
        );
        let res = self
            .call(GenerationRequest::text(&self.reflective_model, prompt))
            .await?;
        let text = res.text.trim();
        if text.is_empty() {
            return Err(ContentError::EmptyResponse);
        }
        safety::policy_check(text).map_err(ContentError::PolicyViolation)?;
        Ok(text.to_string())
    }

    /// One-word sentiment for a single entry. Neutral on any failure.
    pub async fn classify_sentiment(&self, entry: &MoodEntry) -> Sentiment {
        let prompt = format!(
            "Analyze the sentiment of the following mood journal entry from a child. The entry includes an emoji and a text note. Respond with only a single word: \"positive\", \"neutral\", or \"negative\".\n\nEmoji: {}\nNote: \"{}\"",
            entry.emoji.as_deref().unwrap_or("none"),
            if entry.text.is_empty() { "none" } else { entry.text.as_str() }
        );
        match self.call(GenerationRequest::text(&self.fast_model, prompt)).await {
            Ok(res) => Sentiment::from_reply(&res.text),
            Err(e) => {
                tracing::warn!(error = %e, "sentiment classification failed, defaulting to neutral");
                Sentiment::Neutral
            }
        }
    }

    /// Build the journey view over the latest entries. The reflection is only
    /// requested once there are enough entries; sentiments are classified
    /// concurrently.
    pub async fn mood_journey(&self, history: &[MoodEntry]) -> MoodJourney {
        let skip = history.len().saturating_sub(journals::JOURNEY_WINDOW);
        let recent = &history[skip..];

        let insight = if recent.len() >= journals::MIN_ENTRIES_FOR_INSIGHT {
            Some(self.fetch_mood_insight(recent).await)
        } else {
            None
        };

        let sentiments = join_all(recent.iter().map(|e| self.classify_sentiment(e))).await;
        let entries = recent
            .iter()
            .cloned()
            .zip(sentiments)
            .map(|(mut entry, sentiment)| {
                entry.sentiment = Some(sentiment);
                entry
            })
            .collect();

        MoodJourney { entries, insight }
    }
}
