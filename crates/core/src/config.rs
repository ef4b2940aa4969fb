use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    assembler::OverlapPolicy,
    chunker::ChunkUnit,
    error::{Result, SpoilerError},
    provider::Provider,
    ranking::RankingKind,
    resolver::MatchStrategyKind,
    retry::RetryPolicy,
};

pub const CONFIG_ENV: &str = "SPOILER_CONFIG";

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub video: VideoConfig,
    pub prompt: PromptConfig,
    pub assembly: AssemblyConfig,
    pub retry: RetryPolicy,
    pub server: ServerConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: Provider,
    /// Overrides the provider preset's model.
    pub model: Option<String>,
    pub chunk_size: usize,
    pub chunk_unit: ChunkUnit,
    /// Maximum concurrent chunk requests; `None` means one per chunk.
    pub concurrency: Option<usize>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            chunk_size: 2000,
            chunk_unit: ChunkUnit::default(),
            concurrency: None,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VideoConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub collection: String,
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.videodb.io".to_string(),
            api_key_env: "VIDEO_DB_API_KEY".to_string(),
            collection: "default".to_string(),
            timeout_secs: 600,
            poll_interval_ms: 2000,
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PromptConfig {
    pub base_prompt: Option<String>,
    pub base_prompt_file: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssemblyConfig {
    pub match_strategy: MatchStrategyKind,
    pub ranking: RankingKind,
    pub overlap_policy: OverlapPolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub workers: usize,
    pub queue_capacity: usize,
    /// Seconds a finished task stays visible to `/status`.
    pub task_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
            workers: 4,
            queue_capacity: 32,
            task_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    pub csv_path: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            csv_path: Some(PathBuf::from("video_processing_results.csv")),
        }
    }
}

impl Config {
    /// Load config from an explicit path, `$SPOILER_CONFIG`, or
    /// ~/.config/spoiler/config.toml. Only an explicit path must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(config_path);
        if path.exists() {
            Self::from_file(&path)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| SpoilerError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| SpoilerError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// `PORT` overrides the configured server port.
    pub fn apply_env_overrides(&mut self) {
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("spoiler")
        .join("config.toml")
}
