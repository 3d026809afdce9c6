use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use lifeskills_lib::backend::ai_provider::{
    self, ContentBackend, GenerationRequest, GenerationResponse, PlaceReference,
};
use lifeskills_lib::backend::content::{
    self, parse_volunteer_response, ContentService, TaskCategory, DEFAULT_NGO,
    DEFAULT_VOLUNTEER_SUMMARY, FALLBACK_MOOD_INSIGHT,
};
use lifeskills_lib::backend::geolocation::{
    resolve_location, Coordinates, FixedLocation, GeoStatus, LocationError, LocationProvider,
};
use lifeskills_lib::backend::journals::{MoodEntry, Sentiment};
use lifeskills_lib::backend::safety::redact_pii;
use lifeskills_lib::backend::sharing::{self, ShareProvider, ShareRequest};
use lifeskills_lib::config::GeminiConfig;
use lifeskills_lib::error::ContentError;

const HOME: Coordinates = Coordinates { lat: 37.7749, lng: -122.4194 };

struct FailingBackend;

#[async_trait]
impl ContentBackend for FailingBackend {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse, ContentError> {
        Err(ContentError::Status {
            status: 503,
            body: "unavailable".to_string(),
        })
    }
}

struct SlowBackend;

#[async_trait]
impl ContentBackend for SlowBackend {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse, ContentError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(GenerationResponse::default())
    }
}

/// Replies with fixed text and places, recording every request.
struct CannedBackend {
    text: String,
    places: Vec<PlaceReference>,
    seen: Mutex<Vec<GenerationRequest>>,
}

impl CannedBackend {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            places: Vec::new(),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ContentBackend for CannedBackend {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ContentError> {
        self.seen.lock().push(request);
        Ok(GenerationResponse {
            text: self.text.clone(),
            places: self.places.clone(),
        })
    }
}

/// Picks a reply per request.
struct RuleBackend<F>(F);

#[async_trait]
impl<F> ContentBackend for RuleBackend<F>
where
    F: Fn(&GenerationRequest) -> Result<String, ContentError> + Send + Sync,
{
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ContentError> {
        (self.0)(&request).map(|text| GenerationResponse {
            text,
            places: Vec::new(),
        })
    }
}

fn service(backend: Arc<dyn ContentBackend>) -> ContentService {
    ContentService::new(backend, &GeminiConfig::default())
}

fn place(title: &str, uri: &str) -> PlaceReference {
    PlaceReference {
        title: title.to_string(),
        uri: uri.to_string(),
    }
}

fn mood(day: u32, emoji: &str, text: &str) -> MoodEntry {
    MoodEntry {
        timestamp: Utc
            .with_ymd_and_hms(2025, 3, day, 18, 0, 0)
            .single()
            .expect("valid timestamp"),
        emoji: Some(emoji.to_string()),
        text: text.to_string(),
        day: Some(NaiveDate::from_ymd_opt(2025, 3, day).expect("valid date")),
        sentiment: None,
    }
}

#[tokio::test]
async fn test_every_operation_falls_back_on_failure() {
    let svc = service(Arc::new(FailingBackend));

    let story = svc.fetch_story("Maya").await;
    assert_eq!(story, content::fallback_story());
    assert!(!story.title.is_empty() && !story.content.is_empty());

    let report = svc.fetch_volunteer_activities(HOME).await;
    assert_eq!(report, content::fallback_volunteer_report());
    assert_eq!(report.activities.len(), 3);

    let tasks = svc.fetch_time_management_tasks().await;
    assert_eq!(tasks.len(), 8);
    assert_eq!(tasks, content::fallback_time_tasks());

    let insight = svc.fetch_mood_insight(&[mood(1, "😊", "")]).await;
    assert_eq!(insight, FALLBACK_MOOD_INSIGHT);

    assert_eq!(svc.classify_sentiment(&mood(1, "😊", "")).await, Sentiment::Neutral);
}

#[tokio::test]
async fn test_slow_backend_times_out_into_fallback() {
    let svc = service(Arc::new(SlowBackend)).with_timeout(Duration::from_millis(20));
    let tasks = svc.fetch_time_management_tasks().await;
    assert_eq!(tasks, content::fallback_time_tasks());
}

#[tokio::test]
async fn test_story_parses_fenced_json_and_redacts_contacts() {
    let reply = "```json\n{\"title\": \"Maya and the Budget\", \"content\": \"Maya wrote to maya@example.com to plan her savings.\", \"skill\": \"financial literacy\"}\n```";
    let backend = Arc::new(CannedBackend::new(reply));
    let svc = service(backend.clone());

    let story = svc.fetch_story_about("Maya", "financial literacy").await;
    assert_eq!(story.title, "Maya and the Budget");
    assert_eq!(story.skill, "financial literacy");
    assert_eq!(story.content, "Maya wrote to [hidden] to plan her savings.");

    let seen = backend.seen.lock();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].prompt.contains("named Maya"));
    assert!(seen[0].response_schema.is_some());
}

#[test]
fn test_redaction_hides_phones_but_keeps_dates_and_counts() {
    let dated = "School starts on 2024-09-03 and ends 2025-06-14. Save 20 25 30 coins.";
    assert_eq!(redact_pii(dated), dated);
    assert_eq!(redact_pii("Call 555-123-4567 today"), "Call [hidden] today");
    assert_eq!(redact_pii("Ring (555) 123-4567."), "Ring [hidden].");
    assert_eq!(redact_pii("Or +1 555.123.4567"), "Or [hidden]");
}

#[tokio::test]
async fn test_story_with_dates_keeps_them() {
    let reply = r#"{"title": "Maya Plans Ahead", "content": "On 2024-10-14 Maya wrote her exam plan, and by 2024-10-20 she was ready.", "skill": "time management"}"#;
    let svc = service(Arc::new(CannedBackend::new(reply)));
    let story = svc.fetch_story_about("Maya", "time management").await;
    assert_eq!(
        story.content,
        "On 2024-10-14 Maya wrote her exam plan, and by 2024-10-20 she was ready."
    );
}

#[test]
fn test_deadline_covers_every_attempt_and_backoff() {
    let config = GeminiConfig::default();
    let svc = service(Arc::new(FailingBackend));
    let attempts = config.max_attempts;
    let backoff: Duration = (1..attempts).map(ai_provider::backoff_delay).sum();
    assert_eq!(
        svc.deadline(),
        Duration::from_secs(config.timeout_secs) * attempts + backoff
    );
    assert!(svc.deadline() > Duration::from_secs(config.timeout_secs));
}

#[test]
fn test_only_transient_statuses_are_retried() {
    assert!(ai_provider::is_retryable(429));
    assert!(ai_provider::is_retryable(500));
    assert!(ai_provider::is_retryable(503));
    assert!(!ai_provider::is_retryable(400));
    assert!(!ai_provider::is_retryable(401));
    assert!(!ai_provider::is_retryable(403));
    assert!(!ai_provider::is_retryable(404));
}

#[tokio::test]
async fn test_unsafe_or_malformed_story_falls_back() {
    let unsafe_reply = r#"{"title": "Bad", "content": "damn it all", "skill": "x"}"#;
    let svc = service(Arc::new(CannedBackend::new(unsafe_reply)));
    assert_eq!(svc.fetch_story("Maya").await, content::fallback_story());

    let svc = service(Arc::new(CannedBackend::new("Once upon a time...")));
    assert_eq!(svc.fetch_story("Maya").await, content::fallback_story());
}

#[tokio::test]
async fn test_time_tasks_parse_and_empty_list_falls_back() {
    let reply = r#"[
        {"name": "Pack your lunch", "category": "home", "emoji": "🥪"},
        {"name": "Review notes", "category": "Academic", "emoji": "📝"},
        {"name": "Mystery", "category": "Space", "emoji": "🚀"}
    ]"#;
    let svc = service(Arc::new(CannedBackend::new(reply)));
    let tasks = svc.fetch_time_management_tasks().await;
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].category, TaskCategory::Home);
    assert_eq!(tasks[1].name, "Review notes");

    let svc = service(Arc::new(CannedBackend::new("[]")));
    assert_eq!(svc.fetch_time_management_tasks().await.len(), 8);
}

#[test]
fn test_volunteer_lines_matched_to_places() {
    let text = "Volunteering is a great way to help!\n🌳|Greenwood Park|Plant flowers and pick up litter.\n🐶|Happy Paws Shelter|Play with the dogs.\n";
    let places = vec![
        place("Greenwood Park", "https://maps.example/greenwood"),
        place("happy paws shelter", "https://maps.example/paws"),
    ];
    let report = parse_volunteer_response(text, &places);

    assert_eq!(report.summary, "Volunteering is a great way to help!");
    assert_eq!(report.activities.len(), 2);
    assert_eq!(report.activities[0].emoji, "🌳");
    assert_eq!(report.activities[0].description, "Plant flowers and pick up litter.");
    assert_eq!(
        report.activities[0].registration_link.as_deref(),
        Some("https://maps.example/greenwood")
    );
    assert_eq!(report.activities[1].emoji, "🐶");
    assert_eq!(report.activities[1].title, "happy paws shelter");
    assert_eq!(report.activities[1].ngo, DEFAULT_NGO);
}

#[test]
fn test_volunteer_lines_without_places() {
    let text = "🌳|Greenwood Park|Plant flowers.\nnot an item\n📖|City Library|Shelve books.";
    let report = parse_volunteer_response(text, &[]);

    assert_eq!(report.summary, DEFAULT_VOLUNTEER_SUMMARY);
    assert_eq!(report.activities.len(), 2);
    assert_eq!(report.activities[1].title, "City Library");
    assert_eq!(report.activities[1].emoji, "📖");
    assert!(report.activities.iter().all(|a| a.registration_link.is_none()));
}

#[test]
fn test_place_without_matching_line_gets_defaults() {
    let text = "Here are some ideas.\n🌳|Greenwood Park|Plant flowers.";
    let places = vec![place("Community Garden", "")];
    let report = parse_volunteer_response(text, &places);

    assert_eq!(report.activities.len(), 1);
    let a = &report.activities[0];
    assert_eq!(a.emoji, "💖");
    assert_eq!(a.description, "Learn more about Community Garden and how you can help!");
    assert!(a.registration_link.is_none());
}

#[tokio::test]
async fn test_volunteer_request_is_grounded_at_location() {
    let mut canned = CannedBackend::new("Help out!\n🌳|Greenwood Park|Plant flowers.");
    canned.places = vec![place("Greenwood Park", "https://maps.example/greenwood")];
    let backend = Arc::new(canned);
    let svc = service(backend.clone());

    let report = svc.fetch_volunteer_activities(HOME).await;
    assert_eq!(report.activities.len(), 1);
    assert_eq!(backend.seen.lock()[0].maps_location, Some(HOME));

    let svc = service(Arc::new(CannedBackend::new("No places today, sorry.")));
    assert_eq!(
        svc.fetch_volunteer_activities(HOME).await,
        content::fallback_volunteer_report()
    );
}

#[tokio::test]
async fn test_mood_journey_insight_needs_three_entries() {
    let reflective = GeminiConfig::default().reflective_model;
    let backend = Arc::new(RuleBackend(move |req: &GenerationRequest| {
        if req.model == reflective {
            Ok("You had a sunny week. Keep it up!".to_string())
        } else if req.prompt.contains("sunny") {
            Ok("Positive\n".to_string())
        } else {
            Ok("negative".to_string())
        }
    }));
    let svc = service(backend);

    let two = vec![mood(1, "😊", "sunny"), mood(2, "😢", "rainy")];
    let journey = svc.mood_journey(&two).await;
    assert!(journey.insight.is_none());
    assert_eq!(journey.entries.len(), 2);
    assert_eq!(journey.entries[0].sentiment, Some(Sentiment::Positive));
    assert_eq!(journey.entries[1].sentiment, Some(Sentiment::Negative));

    let three = vec![mood(1, "😊", "sunny"), mood(2, "😢", "rainy"), mood(3, "😌", "")];
    let journey = svc.mood_journey(&three).await;
    assert_eq!(journey.insight.as_deref(), Some("You had a sunny week. Keep it up!"));
}

#[tokio::test]
async fn test_mood_journey_window_is_latest_fifteen() {
    let svc = service(Arc::new(CannedBackend::new("neutral")));
    let history: Vec<MoodEntry> = (1..=20).map(|d| mood(d, "😐", "")).collect();
    let journey = svc.mood_journey(&history).await;
    assert_eq!(journey.entries.len(), 15);
    assert_eq!(journey.entries[0].timestamp, history[5].timestamp);
    assert!(journey
        .entries
        .iter()
        .all(|e| e.sentiment == Some(Sentiment::Neutral)));
}

struct DeniedLocation;

#[async_trait]
impl LocationProvider for DeniedLocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Denied("user said no".to_string()))
    }
}

#[tokio::test]
async fn test_location_falls_back_with_advisory() {
    let here = Coordinates { lat: 51.5, lng: -0.12 };
    let granted = resolve_location(Some(&FixedLocation(here)), HOME).await;
    assert_eq!(granted.coordinates, here);
    assert_eq!(granted.status, GeoStatus::Granted);
    assert!(granted.advisory().is_none());

    let denied = resolve_location(Some(&DeniedLocation), HOME).await;
    assert_eq!(denied.coordinates, HOME);
    assert_eq!(denied.status, GeoStatus::Denied);
    assert!(denied.used_default());
    assert!(denied.advisory().is_some());

    let none = resolve_location(None, HOME).await;
    assert_eq!(none.status, GeoStatus::Unavailable);
}

struct RecordingShare {
    available: bool,
    shared: Mutex<Vec<ShareRequest>>,
}

impl ShareProvider for RecordingShare {
    fn is_available(&self) -> bool {
        self.available
    }

    fn share(&self, request: &ShareRequest) -> Result<(), String> {
        self.shared.lock().push(request.clone());
        Ok(())
    }
}

#[test]
fn test_share_story() {
    let story = content::fallback_story();
    let sheet = RecordingShare {
        available: true,
        shared: Mutex::new(Vec::new()),
    };
    assert!(sharing::can_share(Some(&sheet)));
    assert!(sharing::share_story(Some(&sheet), &story, "https://app.example"));
    let shared = sheet.shared.lock();
    assert_eq!(
        shared[0].text,
        "Check out this story from Life Skills Adventure: \"The Missing Homework Mystery\""
    );

    let missing = RecordingShare {
        available: false,
        shared: Mutex::new(Vec::new()),
    };
    assert!(!sharing::can_share(Some(&missing)));
    assert!(!sharing::share_story(Some(&missing), &story, "https://app.example"));
    assert!(!sharing::can_share(None));
}
