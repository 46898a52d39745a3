//! Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::{check_task_length, Advice, AdviceProvider};
use crate::error::AdviceError;
use crate::storage::AdviceConfig;

pub struct GeminiCoach {
    client: Client,
    url: Url,
    api_key: String,
    min_task_chars: usize,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GeminiCoach {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AdviceError> {
        let url = Url::parse(&format!(
            "{}/models/{model}:generateContent",
            endpoint.trim_end_matches('/')
        ))
        .map_err(|e| AdviceError::NotConfigured(format!("bad endpoint '{endpoint}': {e}")))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url,
            api_key: api_key.into(),
            min_task_chars: 0,
        })
    }

    /// Build from config, reading the key from the configured env var.
    pub fn from_config(config: &AdviceConfig) -> Result<Self, AdviceError> {
        if !config.enabled {
            return Err(AdviceError::NotConfigured("advice is disabled".into()));
        }
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                AdviceError::NotConfigured(format!("{} is not set", config.api_key_env))
            })?;
        let mut coach = Self::new(
            &config.endpoint,
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )?;
        coach.min_task_chars = config.min_task_chars;
        Ok(coach)
    }

    fn prompt(task: &str) -> String {
        format!(
            "I am working on this task: \"{task}\". Give me a short productivity tip, \
             a strategy for the next 25 minutes, and a mantra to stay focused."
        )
    }
}

#[async_trait]
impl AdviceProvider for GeminiCoach {
    async fn advise(&self, task: &str) -> Result<Advice, AdviceError> {
        check_task_length(task, self.min_task_chars)?;

        let body = json!({
            "contents": [{ "parts": [{ "text": Self::prompt(task) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "tip": { "type": "STRING" },
                        "strategy": { "type": "STRING" },
                        "focusMantra": { "type": "STRING" }
                    },
                    "required": ["tip", "strategy", "focusMantra"]
                }
            }
        });

        debug!(url = %self.url, "requesting advice");
        let resp = self
            .client
            .post(self.url.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AdviceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| AdviceError::Malformed("response has no candidates".into()))?;

        serde_json::from_str(&text).map_err(|e| AdviceError::Malformed(e.to_string()))
    }
}
