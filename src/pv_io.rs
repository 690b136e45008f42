use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const CONFIG_ENV: &str = "PV_CONFIG";

pub fn user_pv_dir_from(home_dir: &Path) -> PathBuf {
    home_dir.join(".pv")
}

pub fn user_pv_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Could not find home directory")?;
    Ok(user_pv_dir_from(&home_dir))
}

pub fn config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    Ok(user_pv_dir()?.join("config.toml"))
}

pub fn log_dir() -> Result<PathBuf> {
    let dir = user_pv_dir()?.join("logs");
    ensure_dir(&dir).with_context(|| format!("failed to create log dir: {}", dir.display()))?;
    Ok(dir)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))
}

pub fn write_string(path: &Path, content: impl AsRef<str>) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    std::fs::write(path, content.as_ref().as_bytes())
        .with_context(|| format!("failed to write file: {}", path.display()))
}
