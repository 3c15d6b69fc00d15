use std::collections::BTreeMap;

use crate::frame::ElementStyle;

/// Externally owned scene the scheduler draws into.
pub trait SceneSurface {
    /// Ids of every element currently present on the surface.
    fn element_ids(&self) -> Vec<String>;

    fn apply(&mut self, element_id: &str, style: &ElementStyle);
}

/// In-memory scene that stores the last style applied to each element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneState {
    pub elements: BTreeMap<String, ElementStyle>,
    /// Number of `apply` calls received.
    pub applied: usize,
}

impl SceneState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene pre-populated with hidden elements.
    pub fn with_elements<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            elements: ids
                .into_iter()
                .map(|id| (id.into(), ElementStyle::baseline()))
                .collect(),
            applied: 0,
        }
    }

    pub fn style(&self, element_id: &str) -> Option<&ElementStyle> {
        self.elements.get(element_id)
    }

    pub fn opacity(&self, element_id: &str) -> f64 {
        self.style(element_id).map_or(0.0, |s| s.opacity)
    }
}

impl SceneSurface for SceneState {
    fn element_ids(&self) -> Vec<String> {
        self.elements.keys().cloned().collect()
    }

    fn apply(&mut self, element_id: &str, style: &ElementStyle) {
        self.applied += 1;
        self.elements.insert(element_id.to_string(), style.clone());
    }
}
