mod client;
pub(crate) mod types;

use crate::error::AiError;
use crate::message::Message;

use client::OpenRouterClient;
use types::{ChatRequest, WireMessage};

pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";

// =============================================================================
// OpenRouter Agent
// =============================================================================

#[derive(Clone)]
pub struct OpenRouter {
    api_key: String,
    model: String,
    base_url: String,
    app_name: Option<String>,
    site_url: Option<String>,
    http: reqwest::Client,
}

impl OpenRouter {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENROUTER_API_URL.to_string(),
            app_name: None,
            site_url: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    pub fn with_site_url(mut self, url: impl Into<String>) -> Self {
        self.site_url = Some(url.into());
        self
    }

    /// Point the client at a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> OpenRouterClient<'_> {
        OpenRouterClient::new(&self.api_key, &self.base_url, &self.http)
            .with_app_name(self.app_name.as_deref())
            .with_site_url(self.site_url.as_deref())
    }

    /// Chat completion whose response body is constrained to one JSON object.
    ///
    /// Returns the raw message content; decoding it is left to the caller.
    pub async fn json_completion(
        &self,
        messages: &[Message],
        temperature: Option<f32>,
    ) -> Result<String, AiError> {
        let request = ChatRequest::new(&self.model)
            .messages(messages.iter().map(WireMessage::from))
            .temperature(temperature)
            .json_object();

        self.client().first_content(&request).await
    }
}

impl std::fmt::Debug for OpenRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouter")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("app_name", &self.app_name)
            .field("site_url", &self.site_url)
            .finish_non_exhaustive()
    }
}
