//! Shared configuration types for the casetrail CLI and embedding hosts.
//!
//! Hosts read `casetrail.toml` into [`CasetrailConfig`]; every field has a
//! serde default so partial files are accepted. File discovery and CLI
//! overrides live in the binary.

use serde::{Deserialize, Serialize};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "casetrail.toml";

/// Playback speeds a host may offer.
pub const SUPPORTED_SPEEDS: &[f64] = &[0.25, 0.5, 1.0, 1.5, 2.0];

pub const ENV_SERVER_URL: &str = "CASETRAIL_SERVER_URL";
pub const ENV_API_KEY: &str = "CASETRAIL_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CasetrailConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub timeline: TimelineSettings,
    #[serde(default)]
    pub playback: PlaybackSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_server_url")]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineSettings {
    /// Height of one swim lane in pixels.
    #[serde(default = "default_lane_height")]
    pub lane_height: f64,
    /// Zoom factor change per zoom-in/zoom-out button press.
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f64,
    /// Zoom factor change per mouse wheel notch.
    #[serde(default = "default_wheel_step")]
    pub wheel_step: f64,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            lane_height: default_lane_height(),
            zoom_step: default_zoom_step(),
            wheel_step: default_wheel_step(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaybackSettings {
    #[serde(default = "default_speed")]
    pub default_speed: f64,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            default_speed: default_speed(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_server_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_lane_height() -> f64 {
    60.0
}
fn default_zoom_step() -> f64 {
    0.2
}
fn default_wheel_step() -> f64 {
    0.1
}
fn default_speed() -> f64 {
    1.0
}
fn default_frame_interval_ms() -> u64 {
    16
}

pub fn is_supported_speed(speed: f64) -> bool {
    SUPPORTED_SPEEDS.iter().any(|s| (s - speed).abs() < f64::EPSILON)
}

/// Normalize values a hand-edited file may get wrong.
/// Returns true when any field was updated.
pub fn apply_compat_fallbacks(config: &mut CasetrailConfig) -> bool {
    let mut changed = false;

    if config.server.url.trim().is_empty() {
        config.server.url = default_server_url();
        changed = true;
    }
    if config.server.timeout_secs == 0 {
        config.server.timeout_secs = default_timeout_secs();
        changed = true;
    }

    let timeline = &mut config.timeline;
    for (value, fallback) in [
        (&mut timeline.lane_height, default_lane_height()),
        (&mut timeline.zoom_step, default_zoom_step()),
        (&mut timeline.wheel_step, default_wheel_step()),
    ] {
        if !value.is_finite() || *value <= 0.0 {
            *value = fallback;
            changed = true;
        }
    }

    if !is_supported_speed(config.playback.default_speed) {
        config.playback.default_speed = default_speed();
        changed = true;
    }
    if config.playback.frame_interval_ms == 0 {
        config.playback.frame_interval_ms = default_frame_interval_ms();
        changed = true;
    }

    changed
}

/// Apply `CASETRAIL_*` overrides from the given lookup (usually `std::env::var`).
pub fn apply_env_overrides<F>(config: &mut CasetrailConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_SERVER_URL).filter(|v| !v.trim().is_empty()) {
        config.server.url = url;
    }
    if let Some(key) = lookup(ENV_API_KEY) {
        config.server.api_key = key;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg: CasetrailConfig = toml::from_str("").expect("parse empty toml");
        assert_eq!(cfg, CasetrailConfig::default());
        assert_eq!(cfg.timeline.lane_height, 60.0);
        assert_eq!(cfg.playback.frame_interval_ms, 16);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: CasetrailConfig = toml::from_str(
            r#"
[server]
url = "https://cases.example.org"

[playback]
default_speed = 1.5
"#,
        )
        .expect("parse toml");

        assert_eq!(cfg.server.url, "https://cases.example.org");
        assert_eq!(cfg.server.timeout_secs, 30);
        assert_eq!(cfg.playback.default_speed, 1.5);
        assert_eq!(cfg.timeline.zoom_step, 0.2);
    }

    #[test]
    fn apply_compat_fallbacks_repairs_bad_values() {
        let mut cfg: CasetrailConfig = toml::from_str(
            r#"
[timeline]
lane_height = -4.0
wheel_step = 0.0

[playback]
default_speed = 3.0
frame_interval_ms = 0
"#,
        )
        .expect("parse toml");

        assert!(apply_compat_fallbacks(&mut cfg));
        assert_eq!(cfg.timeline.lane_height, 60.0);
        assert_eq!(cfg.timeline.wheel_step, 0.1);
        assert_eq!(cfg.playback.default_speed, 1.0);
        assert_eq!(cfg.playback.frame_interval_ms, 16);
    }

    #[test]
    fn apply_compat_fallbacks_is_noop_for_defaults() {
        let mut cfg = CasetrailConfig::default();
        assert!(!apply_compat_fallbacks(&mut cfg));
    }

    #[test]
    fn env_overrides_replace_server_fields() {
        let mut cfg = CasetrailConfig::default();
        apply_env_overrides(&mut cfg, |key| match key {
            ENV_SERVER_URL => Some("https://override.example".to_string()),
            ENV_API_KEY => Some("secret".to_string()),
            _ => None,
        });
        assert_eq!(cfg.server.url, "https://override.example");
        assert_eq!(cfg.server.api_key, "secret");
    }

    #[test]
    fn serialized_config_round_trips_through_toml() {
        let cfg = CasetrailConfig::default();
        let encoded = toml::to_string(&cfg).expect("serialize config");
        assert!(encoded.contains("[timeline]"));
        let decoded: CasetrailConfig = toml::from_str(&encoded).expect("parse encoded");
        assert_eq!(decoded, cfg);
    }
}
