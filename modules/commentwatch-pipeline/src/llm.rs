use ai_client::{AiError, Message, OpenRouter};
use async_trait::async_trait;

use commentwatch_common::config::ClassificationConfig;

use crate::traits::ClassificationService;

/// Classification through OpenRouter's chat completions in JSON-object mode.
pub struct OpenRouterService {
    agent: Option<OpenRouter>,
    temperature: f32,
}

impl OpenRouterService {
    /// Without an API key the service reports no credential and is never called.
    pub fn new(api_key: Option<String>, config: &ClassificationConfig) -> Self {
        let agent = api_key.map(|key| {
            let mut agent = OpenRouter::new(key, &config.model);
            if let Some(name) = &config.app_name {
                agent = agent.with_app_name(name);
            }
            if let Some(url) = &config.site_url {
                agent = agent.with_site_url(url);
            }
            agent
        });
        Self {
            agent,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl ClassificationService for OpenRouterService {
    fn has_credential(&self) -> bool {
        self.agent.is_some()
    }

    async fn complete_json(&self, prompt: &str) -> Result<String, AiError> {
        let agent = self
            .agent
            .as_ref()
            .ok_or_else(|| AiError::Config("OPENROUTER_API_KEY is not configured".to_string()))?;
        agent
            .json_completion(&[Message::user(prompt)], Some(self.temperature))
            .await
    }
}
