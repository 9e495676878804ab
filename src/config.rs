use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::extract::lexicon::Lexicon;
use crate::graph::decay::DecayConfig;
use crate::layout::{districts, LayoutConfig};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MemopolisConfig {
    pub server: ServerConfig,
    pub workspace: WorkspaceConfig,
    pub extract: ExtractConfig,
    pub decay: DecaySection,
    pub layout: LayoutSection,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Root of the watched files.
    pub path: String,
    pub debounce_ms: u64,
    pub rebuild_on_delete: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ExtractConfig {
    /// Additions to the built-in ticker whitelist.
    pub ticker_whitelist: Vec<String>,
    /// Additions to the built-in ticker stop list.
    pub ticker_stoplist: Vec<String>,
    /// Additions to the tool lexicon.
    pub tools: Vec<String>,
    /// Replacement project patterns (regexes); empty keeps the defaults.
    pub project_patterns: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DecaySection {
    /// Half-life overrides by entity type name, in days. The key `default`
    /// overrides the fallback.
    pub half_lives_days: HashMap<String, f64>,
    /// Source-weight table; order matters, first substring match wins.
    /// Empty keeps the built-in table.
    pub source_weights: Vec<SourceWeight>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceWeight {
    pub pattern: String,
    pub weight: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LayoutSection {
    pub iterations: usize,
    pub bounds: f64,
    pub max_connections: usize,
    /// Optional TOML file providing the district table.
    pub district_definitions: Option<String>,
}

impl Default for MemopolisConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            workspace: WorkspaceConfig::default(),
            extract: ExtractConfig::default(),
            decay: DecaySection::default(),
            layout: LayoutSection::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        let path = default_memopolis_dir()
            .join("workspace")
            .to_string_lossy()
            .into_owned();
        Self {
            path,
            debounce_ms: 500,
            rebuild_on_delete: true,
        }
    }
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            iterations: 150,
            bounds: 80.0,
            max_connections: 150,
            district_definitions: None,
        }
    }
}

/// Returns `~/.memopolis/`
pub fn default_memopolis_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".memopolis")
}

/// Returns the default config file path: `~/.memopolis/config.toml`
pub fn default_config_path() -> PathBuf {
    default_memopolis_dir().join("config.toml")
}

impl MemopolisConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MemopolisConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (MEMOPOLIS_WORKSPACE,
    /// MEMOPOLIS_LOG_LEVEL, MEMOPOLIS_DEBOUNCE_MS, MEMOPOLIS_TICKER_WHITELIST,
    /// MEMOPOLIS_TICKER_STOPLIST, MEMOPOLIS_DISTRICTS).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MEMOPOLIS_WORKSPACE") {
            self.workspace.path = val;
        }
        if let Ok(val) = std::env::var("MEMOPOLIS_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("MEMOPOLIS_DEBOUNCE_MS") {
            if let Ok(ms) = val.parse() {
                self.workspace.debounce_ms = ms;
            }
        }
        if let Ok(val) = std::env::var("MEMOPOLIS_TICKER_WHITELIST") {
            self.extract.ticker_whitelist = split_csv(&val);
        }
        if let Ok(val) = std::env::var("MEMOPOLIS_TICKER_STOPLIST") {
            self.extract.ticker_stoplist = split_csv(&val);
        }
        if let Ok(val) = std::env::var("MEMOPOLIS_DISTRICTS") {
            self.layout.district_definitions = Some(val);
        }
    }

    /// Resolve the workspace path, expanding `~` if needed.
    pub fn resolved_workspace(&self) -> PathBuf {
        expand_tilde(&self.workspace.path)
    }

    /// Build the extraction lexicon from the built-ins plus overrides.
    pub fn lexicon(&self) -> Result<Lexicon> {
        Lexicon::new(
            &self.extract.ticker_whitelist,
            &self.extract.ticker_stoplist,
            &self.extract.tools,
            &self.extract.project_patterns,
        )
    }

    /// Build the decay model from the built-ins plus overrides.
    pub fn decay(&self) -> DecayConfig {
        let source_weights: Vec<(String, f64)> = self
            .decay
            .source_weights
            .iter()
            .map(|s| (s.pattern.clone(), s.weight))
            .collect();
        DecayConfig::from_overrides(&self.decay.half_lives_days, &source_weights)
    }

    /// Build the projector configuration, loading the district table from
    /// disk when one is configured.
    pub fn layout(&self) -> Result<LayoutConfig> {
        let mut layout = LayoutConfig::default();
        layout.sim.iterations = self.layout.iterations;
        layout.sim.bounds = self.layout.bounds;
        layout.max_connections = self.layout.max_connections;
        if let Some(path) = &self.layout.district_definitions {
            layout.districts = districts::load_districts(&expand_tilde(path))?;
        }
        Ok(layout)
    }
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
