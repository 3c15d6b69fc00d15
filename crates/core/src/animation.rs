use serde::{Deserialize, Serialize};

/// Keyframe script for one scene version, durations in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationDataset {
    #[serde(default)]
    pub total_duration: f64,
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
}

impl AnimationDataset {
    /// Every element id referenced by a keyframe, first-seen order, no duplicates.
    pub fn element_ids(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.keyframes
            .iter()
            .map(|k| k.element_id.as_str())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub element_id: String,
    #[serde(default)]
    pub time_offset: f64,
    #[serde(default)]
    pub duration: f64,
    pub action: KeyframeAction,
    #[serde(default)]
    pub properties: KeyframeProperties,
}

impl Keyframe {
    pub fn end(&self) -> f64 {
        self.time_offset + self.duration
    }

    /// Local progress through this keyframe at clock time `t`, in `[0, 1]`.
    /// A zero-length keyframe is complete as soon as it starts.
    pub fn progress_at(&self, t: f64) -> f64 {
        if self.duration <= 0.0 {
            return if t >= self.time_offset { 1.0 } else { 0.0 };
        }
        ((t - self.time_offset) / self.duration).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyframeAction {
    Appear,
    Disappear,
    Highlight,
    Pulse,
    Move,
}

impl KeyframeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Appear => "appear",
            Self::Disappear => "disappear",
            Self::Highlight => "highlight",
            Self::Pulse => "pulse",
            Self::Move => "move",
        }
    }
}

impl std::fmt::Display for KeyframeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyframeProperties {
    #[serde(rename = "fromX", default, skip_serializing_if = "Option::is_none")]
    pub from_x: Option<f64>,
    #[serde(rename = "fromY", default, skip_serializing_if = "Option::is_none")]
    pub from_y: Option<f64>,
    #[serde(rename = "toX", default, skip_serializing_if = "Option::is_none")]
    pub to_x: Option<f64>,
    #[serde(rename = "toY", default, skip_serializing_if = "Option::is_none")]
    pub to_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl KeyframeProperties {
    /// Start and end points of a move; missing coordinates default to the origin.
    pub fn path(&self) -> ((f64, f64), (f64, f64)) {
        (
            (self.from_x.unwrap_or(0.0), self.from_y.unwrap_or(0.0)),
            (self.to_x.unwrap_or(0.0), self.to_y.unwrap_or(0.0)),
        )
    }
}
