use serde::{Deserialize, Serialize};

use crate::backend::content::Story;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRequest {
    pub title: String,
    pub text: String,
    pub url: String,
}

/// Platform share sheet. Not every platform has one.
pub trait ShareProvider: Send + Sync {
    fn is_available(&self) -> bool;
    fn share(&self, request: &ShareRequest) -> Result<(), String>;
}

pub fn story_share_request(story: &Story, app_url: &str) -> ShareRequest {
    ShareRequest {
        title: story.title.clone(),
        text: format!(
            "Check out this story from Life Skills Adventure: \"{}\"",
            story.title
        ),
        url: app_url.to_string(),
    }
}

/// Whether the share action should be offered at all.
pub fn can_share(provider: Option<&dyn ShareProvider>) -> bool {
    provider.is_some_and(|p| p.is_available())
}

/// Share a story if possible. Failures are logged, never raised.
pub fn share_story(provider: Option<&dyn ShareProvider>, story: &Story, app_url: &str) -> bool {
    let Some(provider) = provider.filter(|p| p.is_available()) else {
        return false;
    };
    match provider.share(&story_share_request(story, app_url)) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "share failed");
            false
        }
    }
}
