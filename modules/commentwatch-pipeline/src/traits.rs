// Trait abstractions for the pipeline's external collaborators.
//
// CommentSource: ordered raw comment texts for the watched video.
// StatsSource: one statistics snapshot per run.
// ClassificationService: one prompt in, one JSON object body out.
//
// Production impls live in `sources` (YouTube) and `llm` (OpenRouter); the
// mocks in `testing` let the whole run execute without network access.

use ai_client::AiError;
use anyhow::Result;
use async_trait::async_trait;

use commentwatch_common::VideoStatsSnapshot;

#[async_trait]
pub trait CommentSource: Send + Sync {
    /// Raw comment texts in platform order. May contain repeats.
    async fn comments(&self) -> Result<Vec<String>>;
}

#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Current snapshot, or `None` when the platform has nothing to report.
    async fn snapshot(&self) -> Result<Option<VideoStatsSnapshot>>;
}

#[async_trait]
pub trait ClassificationService: Send + Sync {
    /// Whether a credential is configured. When false the classifier never
    /// calls [`ClassificationService::complete_json`].
    fn has_credential(&self) -> bool;

    /// Send `prompt` as a single user message and return the raw body of a
    /// response constrained to one JSON object.
    async fn complete_json(&self, prompt: &str) -> std::result::Result<String, AiError>;
}
