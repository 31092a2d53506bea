use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use super::types::*;
use crate::error::AiError;

pub(crate) struct OpenRouterClient<'a> {
    api_key: &'a str,
    base_url: &'a str,
    http: &'a reqwest::Client,
    app_name: Option<&'a str>,
    site_url: Option<&'a str>,
}

impl<'a> OpenRouterClient<'a> {
    pub fn new(api_key: &'a str, base_url: &'a str, http: &'a reqwest::Client) -> Self {
        Self {
            api_key,
            base_url,
            http,
            app_name: None,
            site_url: None,
        }
    }

    pub fn with_app_name(mut self, name: Option<&'a str>) -> Self {
        self.app_name = name;
        self
    }

    pub fn with_site_url(mut self, url: Option<&'a str>) -> Self {
        self.site_url = url;
        self
    }

    fn headers(&self) -> Result<HeaderMap, AiError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| AiError::Config(format!("invalid API key header: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(url) = self.site_url {
            if let Ok(val) = HeaderValue::from_str(url) {
                headers.insert("HTTP-Referer", val);
            }
        }

        if let Some(name) = self.app_name {
            if let Ok(val) = HeaderValue::from_str(name) {
                headers.insert("X-Title", val);
            }
        }

        Ok(headers)
    }

    /// Send a chat request and return the first choice's content.
    pub async fn first_content(&self, request: &ChatRequest) -> Result<String, AiError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        debug!(model = %request.model, messages = request.messages.len(), "OpenRouter chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AiError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let chat_response: ChatResponse = serde_json::from_str(&body)?;
        if let Some(usage) = &chat_response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "OpenRouter usage"
            );
        }

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AiError::Parse("No content in OpenRouter response".to_string()))
    }
}
