use std::sync::Arc;

use lifeskills_lib::backend::ai_provider::GeminiClient;
use lifeskills_lib::backend::content::ContentService;
use lifeskills_lib::backend::geolocation;
use lifeskills_lib::config::{self, AppConfig};
use lifeskills_lib::logging::init_logging;

/// Calls each content operation once against the configured API and prints
/// what came back. Without a key every call shows its fallback.
#[tokio::main]
async fn main() {
    config::load_dotenv();
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {e}");
            std::process::exit(1);
        }
    };
    let _guard = init_logging(&config.logging);

    if config.gemini.api_key.is_none() {
        println!("GEMINI_API_KEY not set; expect fallback content.");
    }
    let backend = match GeminiClient::new(&config.gemini) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("could not build client: {e}");
            std::process::exit(1);
        }
    };
    let content = ContentService::new(Arc::new(backend), &config.gemini);

    let story = content.fetch_story("Explorer").await;
    println!("story: {} [{}]", story.title, story.skill);
    println!("{}", story.content.chars().take(400).collect::<String>());

    let tasks = content.fetch_time_management_tasks().await;
    println!("tasks:");
    for t in &tasks {
        println!("  {} {} ({:?})", t.emoji, t.name, t.category);
    }

    let location = geolocation::resolve_location(None, config.location.default_coordinates()).await;
    if let Some(note) = location.advisory() {
        println!("{note}");
    }
    let report = content.fetch_volunteer_activities(location.coordinates).await;
    println!("volunteering: {}", report.summary);
    for a in &report.activities {
        println!(
            "  {} {} - {} [{}]",
            a.emoji,
            a.title,
            a.description,
            a.registration_link.as_deref().unwrap_or("no link")
        );
    }

    let insight = content.fetch_mood_insight(&[]).await;
    println!("mood insight: {insight}");
}
