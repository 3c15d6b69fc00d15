use anyhow::{Context, Result};
use casetrail_runtime_config::{
    CONFIG_FILE_NAME, CasetrailConfig, apply_compat_fallbacks, apply_env_overrides,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

use casetrail_api_client::ApiClient;

/// Get the config directory path (~/.config/casetrail/)
pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".config").join("casetrail"))
}

/// Canonical config file path.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

fn read_config_file(path: &Path) -> Result<CasetrailConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config at {}", path.display()))
}

/// Config exactly as stored on disk, default if the file does not exist.
fn load_file_config() -> Result<CasetrailConfig> {
    let path = config_path()?;
    let mut config = if path.exists() {
        read_config_file(&path)?
    } else {
        CasetrailConfig::default()
    };
    if apply_compat_fallbacks(&mut config) {
        tracing::warn!(
            "out-of-range values in {} were replaced with defaults",
            path.display()
        );
    }
    Ok(config)
}

/// Effective config: file values with `CASETRAIL_*` environment overrides.
pub fn load_config() -> Result<CasetrailConfig> {
    let mut config = load_file_config()?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

pub fn save_config(config: &CasetrailConfig) -> Result<()> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config dir at {}", dir.display()))?;

    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    let path = config_path()?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write config at {}", path.display()))?;
    Ok(())
}

/// HTTP client for the configured server.
pub fn api_client(config: &CasetrailConfig) -> Result<ApiClient> {
    let mut client = ApiClient::new(
        &config.server.url,
        Duration::from_secs(config.server.timeout_secs),
    )
    .context("Failed to build HTTP client")?;
    client.set_auth(config.server.api_key.clone());
    Ok(client)
}

fn masked(key: &str) -> String {
    if key.is_empty() {
        "(not set)".to_string()
    } else {
        format!("{}...", &key[..key.char_indices().nth(8).map_or(key.len(), |(i, _)| i)])
    }
}

/// Print current config.
pub fn show_config() -> Result<()> {
    let config = load_config()?;
    let path = config_path()?;
    println!("Config file: {}", path.display());
    println!();
    println!("[server]");
    println!("  url          = {}", config.server.url);
    println!("  api_key      = {}", masked(&config.server.api_key));
    println!("  timeout_secs = {}", config.server.timeout_secs);
    println!();
    println!("[timeline]");
    println!("  lane_height = {}", config.timeline.lane_height);
    println!("  zoom_step   = {}", config.timeline.zoom_step);
    println!("  wheel_step  = {}", config.timeline.wheel_step);
    println!();
    println!("[playback]");
    println!("  default_speed     = {}", config.playback.default_speed);
    println!("  frame_interval_ms = {}", config.playback.frame_interval_ms);
    Ok(())
}

/// Update config with provided values.
pub fn set_config(server_url: Option<String>, api_key: Option<String>) -> Result<()> {
    let mut config = load_file_config()?;

    if let Some(url) = server_url {
        config.server.url = url;
    }
    if let Some(key) = api_key {
        config.server.api_key = key;
    }

    save_config(&config)?;
    println!("Configuration updated.");
    show_config()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_is_masked_after_eight_chars() {
        assert_eq!(masked(""), "(not set)");
        assert_eq!(masked("abc"), "abc...");
        assert_eq!(masked("0123456789abcdef"), "01234567...");
    }
}
