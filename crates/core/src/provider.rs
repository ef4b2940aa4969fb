use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Missing API key for {provider_name}: {env_var} is not set")]
    MissingApiKey {
        provider_name: String,
        env_var: String,
    },
}

/// LLM backend used by the sentence selector. All presets speak the
/// OpenAI-compatible chat completions protocol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Openai,
    Grok,
    Gemini,
}

/// Endpoint, default model and key variable that `ChatCompletionsClient`
/// is built from. `llm.model` in the config file overrides `model`.
pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-4",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-2.5-pro",
                env_var: "GEMINI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Openai => "OpenAI",
            Provider::Grok => "Grok",
            Provider::Gemini => "Gemini",
        }
    }

    /// Read the provider's API key; an unset or blank variable is missing.
    pub fn validate_api_key(&self) -> Result<String, ProviderError> {
        let config = self.config();
        std::env::var(config.env_var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ProviderError::MissingApiKey {
                provider_name: self.name().to_string(),
                env_var: config.env_var.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_is_a_chat_completions_endpoint() {
        for provider in [Provider::Openai, Provider::Grok, Provider::Gemini] {
            let config = provider.config();
            assert!(config.api_url.ends_with("/chat/completions"));
            assert!(config.env_var.ends_with("_API_KEY"));
        }
    }

    #[test]
    fn openai_is_default_preset() {
        let provider = Provider::default();
        assert_eq!(provider, Provider::Openai);
        assert_eq!(provider.config().model, "gpt-4");
        assert_eq!(provider.config().env_var, "OPENAI_API_KEY");
    }

    #[test]
    fn provider_names_deserialize_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            provider: Provider,
        }
        let w: Wrapper = toml::from_str(r#"provider = "grok""#).unwrap();
        assert_eq!(w.provider, Provider::Grok);
    }
}
