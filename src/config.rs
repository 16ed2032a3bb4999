use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Path to the JSON file holding the decision case corpus.
    pub cases_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogsConfig {
    /// Directory where session log files are written.
    #[serde(default = "default_logs_dir")]
    pub dir: PathBuf,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            dir: default_logs_dir(),
        }
    }
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("./logs")
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `"openai"` or `"gemini"`. Selected once at startup; the process
    /// never switches providers mid-run.
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Number of similar cases returned by `POST /cases/search`.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    match config.embedding.provider.as_str() {
        "openai" | "gemini" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be openai or gemini.",
            other
        ),
    }

    if config.embedding.dims == Some(0) {
        anyhow::bail!("embedding.dims must be > 0 when set");
    }

    if config.search.top_k == 0 {
        anyhow::bail!("search.top_k must be >= 1");
    }

    Ok(config)
}
