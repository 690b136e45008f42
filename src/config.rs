use std::path::Path;
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "https://www.pivotaltracker.com/services/v5";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default)]
    pub project_ids: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// External commands invoked by `pull-request` and `land`. The title is
/// appended as the final argument.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ToolsConfig {
    #[serde(default = "default_pull_request_command")]
    pub pull_request: Vec<String>,
    #[serde(default = "default_land_command")]
    pub land: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            pull_request: default_pull_request_command(),
            land: default_land_command(),
        }
    }
}

fn default_pull_request_command() -> Vec<String> {
    vec!["hub".to_string(), "pull-request".to_string(), "-m".to_string()]
}

fn default_land_command() -> Vec<String> {
    vec!["git".to_string(), "land".to_string()]
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!(
                "no configuration at {} (run `pv setup`)",
                path.display()
            ));
        }
        let content = crate::pv_io::read_to_string(path)?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Loads the config, treating a missing file as an empty one.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("failed to encode config")?;
        crate::pv_io::write_string(path, content)
    }

    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty()
            && validate_token(&self.api_token)
            && !self.project_ids.is_empty()
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }
}

pub fn validate_token(token: &str) -> bool {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9]{32}$").expect("token pattern is valid"))
        .is_match(token)
}

pub fn parse_project_ids(input: &str) -> Result<Vec<u64>> {
    let mut ids = Vec::new();
    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let id = part
            .parse::<u64>()
            .map_err(|_| anyhow!("invalid project id: {part}"))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        return Err(anyhow!("at least one project id is required"));
    }
    Ok(ids)
}
