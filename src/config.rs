//! Runtime configuration — loading, env overrides, and validation.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    APP_NAME, DEFAULT_BASE_URL, DEFAULT_CREATOR_IMAGE, DEFAULT_MAX_TURNS, DEFAULT_MODEL,
};
use crate::util::{env_first, normalize_url};

/// Top-level configuration for the assistant.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MindConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Upstream OpenAI-compatible endpoint and models.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
    /// Model used by the start-up liveness probe; defaults to `model`.
    #[serde(default)]
    pub probe_model: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            probe_model: None,
        }
    }
}

impl ProviderConfig {
    pub fn probe_model(&self) -> &str {
        self.probe_model.as_deref().unwrap_or(&self.model)
    }
}

/// Static assets referenced by tools.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AssetConfig {
    pub creator_image: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            creator_image: PathBuf::from(DEFAULT_CREATOR_IMAGE),
        }
    }
}

/// Orchestration runner tunables.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RunnerConfig {
    /// Maximum number of model calls inside one run.
    pub max_turns: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

/// Where the configuration was loaded from.
#[derive(Clone, Debug)]
pub enum ConfigSource {
    Embedded,
    File(PathBuf),
}

impl ConfigSource {
    pub fn label(&self) -> String {
        match self {
            ConfigSource::Embedded => "embedded defaults".to_string(),
            ConfigSource::File(path) => path.display().to_string(),
        }
    }
}

impl MindConfig {
    /// Load the configuration file, then apply environment overrides.
    pub fn load() -> Result<(Self, ConfigSource)> {
        let (mut config, source) = Self::load_file()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok((config, source))
    }

    fn load_file() -> Result<(Self, ConfigSource)> {
        if let Ok(path) = env::var("ASA_MIND_CONFIG") {
            let path = PathBuf::from(path);
            return Ok((Self::load_from_path(&path)?, ConfigSource::File(path)));
        }

        let cwd_path = PathBuf::from("asa-mind.json");
        if cwd_path.exists() {
            return Ok((Self::load_from_path(&cwd_path)?, ConfigSource::File(cwd_path)));
        }

        if let Some(config_path) = config_dir_file("asa-mind.json") {
            if config_path.exists() {
                return Ok((
                    Self::load_from_path(&config_path)?,
                    ConfigSource::File(config_path),
                ));
            }
        }

        let embedded = Self::parse(include_str!("../asa-mind.json"))
            .context("parse embedded asa-mind.json")?;
        Ok((embedded, ConfigSource::Embedded))
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read config from {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parse config from {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(base_url) = env_first(&["OPENAI_BASE_URL", "OPENAI_API_BASE"]) {
            self.provider.base_url = base_url;
        }
        if let Some(model) = env_first(&["OPENAI_MODEL", "ASA_MIND_MODEL"]) {
            self.provider.model = model;
        }
    }

    /// Normalise the base URL and reject values that cannot be parsed.
    pub fn validate(&mut self) -> Result<()> {
        let normalized = normalize_url(self.provider.base_url.trim());
        let parsed = Url::parse(&normalized)
            .with_context(|| format!("invalid provider base_url: {normalized}"))?;
        if parsed.cannot_be_a_base() {
            return Err(anyhow!("provider base_url is not a base URL: {normalized}"));
        }
        if self.provider.model.trim().is_empty() {
            return Err(anyhow!("provider model must not be empty"));
        }
        if self.runner.max_turns == 0 {
            return Err(anyhow!("runner.max_turns must be at least 1"));
        }
        self.provider.base_url = normalized.trim_end_matches('/').to_string();
        Ok(())
    }
}

fn config_dir_file(filename: &str) -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", APP_NAME, APP_NAME)?;
    Some(proj_dirs.config_dir().join(filename))
}
