use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::models::Result;

/// The external reasoning capability: structured prompt in, one JSON object
/// out. The pipeline only depends on this contract.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete_json(&self, system: &str, prompt: &str) -> Result<Value>;
}

/// Chat-completions client with a forced JSON-object response format.
pub struct OpenAiCompletion {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiCompletion {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            model,
            base_url: "https://api.openai.com".to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete_json(&self, system: &str, prompt: &str) -> Result<Value> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt}
            ],
            "response_format": {"type": "json_object"}
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(format!("completion API returned status {}", response.status()).into());
        }

        let payload: Value = response.json().await?;
        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or("completion response missing message content")?;

        Ok(serde_json::from_str(content)?)
    }
}
