pub mod backend;
pub mod config;
pub mod error;
pub mod logging;

use std::sync::Arc;

pub use backend::ai_provider;
pub use config::AppConfig;
pub use error::{LifeSkillsError, Result};

use backend::ai_provider::{ContentBackend, GeminiClient};
use backend::content::{ContentService, Story};
use backend::geolocation::{self, LocationProvider, ResolvedLocation};
use backend::session::{ActionOutcome, LifeSkillsContext, QualifyingAction};
use backend::storage::{KeyValueStore, SqliteStore};
use backend::utility::{Clock, SystemClock};

/// Everything a front end needs: the hydrated session plus the content facade.
pub struct App {
    pub context: LifeSkillsContext,
    pub content: ContentService,
    config: AppConfig,
}

impl App {
    /// Open the configured store, hydrate the session and build a Gemini-backed
    /// content service.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&config.storage.path)?);
        let backend: Arc<dyn ContentBackend> = Arc::new(GeminiClient::new(&config.gemini)?);
        Self::with_parts(config, store, Arc::new(SystemClock), backend)
    }

    pub fn with_parts(
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        backend: Arc<dyn ContentBackend>,
    ) -> Result<Self> {
        let context = LifeSkillsContext::hydrate(store, clock)?;
        let content = ContentService::new(backend, &config.gemini);
        Ok(Self {
            context,
            content,
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Fetch a story for the signed-in user and count the read.
    pub async fn read_story(&mut self) -> Result<(Story, ActionOutcome)> {
        let story = self.content.fetch_story(self.context.display_name()).await;
        let outcome = self.context.record_action(QualifyingAction::ReadStory)?;
        Ok((story, outcome))
    }

    /// Device location, or the configured default with an advisory status.
    pub async fn locate(&self, provider: Option<&dyn LocationProvider>) -> ResolvedLocation {
        geolocation::resolve_location(provider, self.config.location.default_coordinates()).await
    }
}
