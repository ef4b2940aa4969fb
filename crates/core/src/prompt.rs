use tokio::fs;
use tracing::debug;

use crate::{
    config::PromptConfig,
    error::{Result, SpoilerError},
    types::{DurationMode, JobSpec},
};

pub const DEFAULT_BASE_PROMPT: &str = "You are cutting a spoiler reel: a short highlight video that \
gives away the key story beats of the source. Favour moments that reveal plot turns, decisions, \
confrontations and outcomes over scene-setting or small talk. Keep the selected moments \
understandable on their own when played back to back.";

static SENTENCE_SELECTION_PROMPT: &str = r#"
You are a video editor who uses AI. Given a user prompt and the transcript of a video, analyze the
text to identify sentences in the transcript relevant to the user prompt for making clips.

- Instructions:
  - Evaluate the sentences for relevance to the specified user prompt.
  - Make sure that sentences start and end properly and meaningfully complete the discussion or
    topic. Choose the one with the greatest relevance and longest.
  - The sentences will be cut into video clips, so optimize for a great viewing experience.
  - If the matched sentences are not too far apart, merge them into one sentence.
  - Strictly make each result minimum 20 words long. If the match is shorter, adjust the
    boundaries and add more context around the sentence.

- Output Format: Return a JSON list of strings named 'sentences' that contains the output
  sentences; they must be exact substrings of the transcript.
- User Prompts: User prompts may include requests like 'find funny moments' or 'find moments for
  social media'. Interpret these by identifying keywords or themes in the transcript that match
  the intent of the prompt.
"#;

static OUTPUT_CONTRACT: &str = r#"
Ensure the final output strictly adheres to the JSON format specified without including
additional text or explanations. If there is no match return {"sentences": []} without
additional text. Use the following structure for your response:
{
  "sentences": [
    "...",
    ...
  ]
}
"#;

/// Resolve the base prompt: a configured file wins, then inline text, then
/// the built-in default. A configured but unusable source is fatal.
pub async fn load_base_prompt(config: &PromptConfig) -> Result<String> {
    if let Some(path) = &config.base_prompt_file {
        debug!("Loading base prompt from {}", path.display());
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| SpoilerError::MissingBasePrompt {
                reason: format!("cannot read {}: {e}", path.display()),
            })?;
        return non_blank(content, || format!("{} is empty", path.display()));
    }

    if let Some(inline) = &config.base_prompt {
        return non_blank(inline.clone(), || "inline base_prompt is empty".to_string());
    }

    Ok(DEFAULT_BASE_PROMPT.to_string())
}

fn non_blank(prompt: String, reason: impl FnOnce() -> String) -> Result<String> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(SpoilerError::MissingBasePrompt { reason: reason() });
    }
    Ok(trimmed.to_string())
}

/// Natural-language phrasing of the job's title, genres and length.
pub fn user_instruction(job: &JobSpec) -> String {
    let genres = job.genres.join(", ");
    match job.target.mode {
        DurationMode::Percentage => format!(
            "Create a summary that is {}% of the original video length for a {} video titled '{}'.",
            job.target.value, genres, job.title
        ),
        DurationMode::Seconds => {
            let secs = job.target.value.max(0.0).round() as u64;
            format!(
                "Create a {}-minute and {}-second summary for a {} video titled '{}'.",
                secs / 60,
                secs % 60,
                genres,
                job.title
            )
        }
    }
}

pub fn full_prompt(base_prompt: &str, job: &JobSpec) -> String {
    format!(
        "{base_prompt}\n\nSpecific instructions: {}",
        user_instruction(job)
    )
}

/// Prompt sent for a single transcript chunk.
pub fn chunk_prompt(chunk: &str, prompt: &str) -> String {
    format!(
        "{SENTENCE_SELECTION_PROMPT}\nTranscript: {chunk}\nUser Prompt: {prompt}\n{OUTPUT_CONTRACT}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TargetDuration;
    use std::io::Write;

    fn job(target: TargetDuration) -> JobSpec {
        JobSpec {
            video_url: "https://example.com/v.mp4".to_string(),
            title: "The Heist".to_string(),
            genres: vec!["Thriller".to_string(), "Crime".to_string()],
            target,
        }
    }

    #[test]
    fn seconds_instruction_splits_minutes() {
        assert_eq!(
            user_instruction(&job(TargetDuration::seconds(150.0))),
            "Create a 2-minute and 30-second summary for a Thriller, Crime video titled 'The Heist'."
        );
    }

    #[test]
    fn percentage_instruction() {
        assert_eq!(
            user_instruction(&job(TargetDuration::percentage(25.0))),
            "Create a summary that is 25% of the original video length for a Thriller, Crime video titled 'The Heist'."
        );
    }

    #[test]
    fn full_prompt_appends_specific_instructions() {
        let prompt = full_prompt("BASE", &job(TargetDuration::seconds(60.0)));
        assert!(prompt.starts_with("BASE\n\nSpecific instructions: Create a 1-minute and 0-second"));
    }

    #[test]
    fn chunk_prompt_embeds_chunk_and_contract() {
        let prompt = chunk_prompt("Alice revealed the plan", "find the twist");
        assert!(prompt.contains("video editor who uses AI"));
        assert!(prompt.contains("minimum 20 words"));
        assert!(prompt.contains("Transcript: Alice revealed the plan"));
        assert!(prompt.contains("User Prompt: find the twist"));
        assert!(prompt.contains(r#"{"sentences": []}"#));
    }

    #[tokio::test]
    async fn builtin_prompt_when_nothing_configured() {
        let prompt = load_base_prompt(&PromptConfig::default()).await.unwrap();
        assert_eq!(prompt, DEFAULT_BASE_PROMPT);
    }

    #[tokio::test]
    async fn missing_prompt_file_is_fatal() {
        let config = PromptConfig {
            base_prompt: Some("ignored".to_string()),
            base_prompt_file: Some("/nonexistent/spoiler_prompt.txt".into()),
        };
        assert!(matches!(
            load_base_prompt(&config).await,
            Err(SpoilerError::MissingBasePrompt { .. })
        ));
    }

    #[tokio::test]
    async fn prompt_file_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  Spoil everything.  ").unwrap();
        let config = PromptConfig {
            base_prompt: None,
            base_prompt_file: Some(file.path().to_path_buf()),
        };
        assert_eq!(load_base_prompt(&config).await.unwrap(), "Spoil everything.");
    }

    #[tokio::test]
    async fn blank_inline_prompt_is_fatal() {
        let config = PromptConfig {
            base_prompt: Some("   ".to_string()),
            base_prompt_file: None,
        };
        assert!(load_base_prompt(&config).await.is_err());
    }
}
