use async_trait::async_trait;
use tracing::debug;

use crate::{
    error::{Result, SpoilerError},
    provider::Provider,
};

/// Turns a prompt into the model's raw text reply.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    api_url: String,
    model: String,
    api_key: String,
    temperature: f32,
}

impl ChatCompletionsClient {
    pub fn new(http: reqwest::Client, provider: &Provider, model: Option<&str>) -> Result<Self> {
        let config = provider.config();
        let api_key = provider.validate_api_key()?;
        Ok(Self {
            http,
            api_url: config.api_url.to_string(),
            model: model.unwrap_or(config.model).to_string(),
            api_key,
            temperature: 0.6,
        })
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!("Sending {} prompt chars to {}", prompt.len(), self.model);

        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "system",
                        "content": prompt,
                    },
                ],
                "temperature": self.temperature,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(SpoilerError::Llm {
                reason: format!("API returned {status}: {body}"),
            });
        }

        let json: serde_json::Value = resp.json().await?;
        extract_message_content(&json)
    }
}

fn extract_message_content(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| SpoilerError::Llm {
            reason: format!("unexpected response format: {json}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_choice() {
        let json = serde_json::json!({
            "choices": [
                {"message": {"role": "assistant", "content": "{\"sentences\": []}"}}
            ]
        });
        assert_eq!(extract_message_content(&json).unwrap(), "{\"sentences\": []}");
    }

    #[test]
    fn missing_choices_is_an_error() {
        let json = serde_json::json!({"error": {"message": "rate limited"}});
        assert!(extract_message_content(&json).is_err());
    }
}
