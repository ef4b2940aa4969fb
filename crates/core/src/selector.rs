use std::sync::Arc;

use serde::Deserialize;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, info, warn};

use crate::{
    error::{Result, SpoilerError},
    llm::LlmClient,
    prompt::chunk_prompt,
    retry::{RetryPolicy, retry, with_timeout},
};

#[derive(Debug, Clone, Copy)]
pub struct SelectorOptions {
    /// Maximum in-flight LLM calls; `None` runs every chunk at once.
    pub concurrency: Option<usize>,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            concurrency: None,
            timeout_secs: 120,
            retry: RetryPolicy::none(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SentencesReply {
    sentences: Vec<serde_json::Value>,
}

/// Parse a `{"sentences": [...]}` reply. A surrounding Markdown code fence
/// is tolerated; non-string and blank items are skipped.
pub fn parse_sentences(raw: &str) -> Result<Vec<String>> {
    let reply: SentencesReply = serde_json::from_str(strip_code_fence(raw))?;
    Ok(reply
        .sentences
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
        .collect())
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Ask the LLM for relevant sentences in every chunk concurrently.
///
/// A chunk whose call fails or whose reply does not parse contributes
/// nothing. Results are merged in completion order.
pub async fn select_sentences(
    llm: Arc<dyn LlmClient>,
    chunks: &[&str],
    prompt: &str,
    options: SelectorOptions,
) -> Vec<String> {
    let permits = options.concurrency.unwrap_or(chunks.len()).max(1);
    let semaphore = Arc::new(Semaphore::new(permits));
    let mut set = JoinSet::new();

    for (index, chunk) in chunks.iter().enumerate() {
        let llm = Arc::clone(&llm);
        let semaphore = Arc::clone(&semaphore);
        let request = chunk_prompt(chunk, prompt);

        set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| SpoilerError::Llm {
                    reason: e.to_string(),
                })?;
            let reply = retry(options.retry, || {
                with_timeout("LLM request", options.timeout_secs, llm.complete(&request))
            })
            .await?;
            debug!("Chunk {index} reply: {reply}");
            parse_sentences(&reply).map(|sentences| (index, sentences))
        });
    }

    let mut merged = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok((index, sentences))) => {
                info!("Chunk {index} yielded {} sentences", sentences.len());
                merged.extend(sentences);
            }
            Ok(Err(e)) => warn!("Chunk failed to work with LLM: {e}"),
            Err(e) => warn!("Chunk task aborted: {e}"),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_reply() {
        let sentences = parse_sentences(r#"{"sentences": ["Alice revealed the plan"]}"#).unwrap();
        assert_eq!(sentences, vec!["Alice revealed the plan".to_string()]);
    }

    #[test]
    fn parses_empty_reply() {
        assert!(parse_sentences(r#"{"sentences": []}"#).unwrap().is_empty());
    }

    #[test]
    fn parses_fenced_reply() {
        let raw = "```json\n{\"sentences\": [\"a b c\", 42, \"  \"]}\n```";
        assert_eq!(parse_sentences(raw).unwrap(), vec!["a b c".to_string()]);
    }

    #[test]
    fn prose_is_rejected() {
        assert!(parse_sentences("Here are the sentences you asked for").is_err());
        assert!(parse_sentences(r#"{"clips": []}"#).is_err());
    }
}
