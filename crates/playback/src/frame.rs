//! Frame computation for keyframe playback.
//!
//! A frame depends only on the dataset, the clock time and the set of known
//! element ids, so seeking to `t` and playing up to `t` produce the same
//! result.

use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::TAU;

use casetrail_core::{AnimationDataset, Keyframe, KeyframeAction};

/// Maximum highlight glow radius in pixels.
pub const MAX_GLOW: f64 = 20.0;
/// Scale of an element at the very start of its appear transition.
const APPEAR_START_SCALE: f64 = 0.5;
const PULSE_AMPLITUDE: f64 = 0.1;

/// Visual state applied to one scene element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementStyle {
    pub opacity: f64,
    pub scale: f64,
    pub translate: (f64, f64),
    pub glow: f64,
    pub glow_color: Option<String>,
    /// Set while a highlight keyframe is running.
    pub active: bool,
}

impl ElementStyle {
    /// Hidden, untransformed, inactive.
    pub fn baseline() -> Self {
        Self {
            opacity: 0.0,
            scale: 1.0,
            translate: (0.0, 0.0),
            glow: 0.0,
            glow_color: None,
            active: false,
        }
    }

    fn shown() -> Self {
        Self {
            opacity: 1.0,
            ..Self::baseline()
        }
    }

    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self::baseline()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub time: f64,
    pub elements: BTreeMap<String, ElementStyle>,
}

impl Frame {
    pub fn get(&self, element_id: &str) -> Option<&ElementStyle> {
        self.elements.get(element_id)
    }

    pub fn visible(&self) -> impl Iterator<Item = &str> {
        self.elements
            .iter()
            .filter(|(_, style)| style.is_visible())
            .map(|(id, _)| id.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Completed,
    Active,
    Future,
}

fn phase(kf: &Keyframe, t: f64) -> Phase {
    if kf.end() < t {
        Phase::Completed
    } else if kf.time_offset <= t {
        Phase::Active
    } else {
        Phase::Future
    }
}

/// Compute the scene at clock time `t`.
///
/// Every element in `known` plus every keyframe target starts from the
/// baseline. Completed keyframes are replayed in array order to decide which
/// elements are visible; running keyframes are then interpolated on top.
pub fn compute_frame<'a, I>(dataset: &AnimationDataset, t: f64, known: I) -> Frame
where
    I: IntoIterator<Item = &'a str>,
{
    let mut elements: BTreeMap<String, ElementStyle> = known
        .into_iter()
        .map(|id| (id.to_string(), ElementStyle::baseline()))
        .collect();
    for id in dataset.element_ids() {
        elements.entry(id.to_string()).or_default();
    }

    let mut visible: BTreeSet<&str> = BTreeSet::new();
    for kf in dataset.keyframes.iter().filter(|kf| phase(kf, t) == Phase::Completed) {
        match kf.action {
            KeyframeAction::Appear => {
                visible.insert(kf.element_id.as_str());
            }
            KeyframeAction::Disappear => {
                visible.remove(kf.element_id.as_str());
            }
            KeyframeAction::Highlight | KeyframeAction::Pulse | KeyframeAction::Move => {}
        }
    }
    for id in visible {
        elements.insert(id.to_string(), ElementStyle::shown());
    }

    for kf in dataset.keyframes.iter().filter(|kf| phase(kf, t) == Phase::Active) {
        let p = kf.progress_at(t);
        let style = elements.entry(kf.element_id.clone()).or_default();
        apply_active(style, kf, p);
    }

    Frame { time: t, elements }
}

fn apply_active(style: &mut ElementStyle, kf: &Keyframe, p: f64) {
    match kf.action {
        KeyframeAction::Appear => {
            style.opacity = p;
            style.scale = APPEAR_START_SCALE + (1.0 - APPEAR_START_SCALE) * p;
        }
        KeyframeAction::Disappear => {
            style.opacity = 1.0 - p;
        }
        KeyframeAction::Highlight => {
            style.glow = MAX_GLOW * p;
            style.glow_color = kf.properties.color.clone();
            style.active = true;
        }
        KeyframeAction::Pulse => {
            style.scale = 1.0 + PULSE_AMPLITUDE * (TAU * p).sin();
        }
        KeyframeAction::Move => {
            let ((fx, fy), (tx, ty)) = kf.properties.path();
            style.translate = (fx + (tx - fx) * p, fy + (ty - fy) * p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casetrail_core::testing::{animation, keyframe};

    fn appear_a() -> AnimationDataset {
        animation(10.0, vec![keyframe("a", 2.0, 2.0, KeyframeAction::Appear)])
    }

    fn opacity(frame: &Frame, id: &str) -> f64 {
        frame.get(id).map_or(f64::NAN, |s| s.opacity)
    }

    #[test]
    fn appear_fades_in_then_stays_visible() {
        let data = appear_a();
        let none: [&str; 0] = [];
        assert_eq!(opacity(&compute_frame(&data, 1.0, none), "a"), 0.0);
        assert_eq!(opacity(&compute_frame(&data, 3.0, none), "a"), 0.5);
        assert_eq!(opacity(&compute_frame(&data, 5.0, none), "a"), 1.0);
        assert_eq!(opacity(&compute_frame(&data, 8.0, none), "a"), 1.0);

        let mid = compute_frame(&data, 3.0, none);
        assert_eq!(mid.get("a").map(|s| s.scale), Some(0.75));
    }

    #[test]
    fn boundary_of_a_keyframe_counts_as_running() {
        let data = appear_a();
        let at_end = compute_frame(&data, 4.0, []);
        assert_eq!(opacity(&at_end, "a"), 1.0);
        assert_eq!(at_end.get("a").map(|s| s.scale), Some(1.0));
    }

    #[test]
    fn known_elements_without_keyframes_stay_hidden() {
        let data = appear_a();
        let frame = compute_frame(&data, 8.0, ["tree", "a"]);
        assert_eq!(frame.elements.len(), 2);
        assert_eq!(frame.get("tree"), Some(&ElementStyle::baseline()));
        assert_eq!(frame.visible().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn disappear_removes_from_visible_set_in_array_order() {
        let data = animation(
            10.0,
            vec![
                keyframe("car", 0.0, 1.0, KeyframeAction::Appear),
                keyframe("car", 2.0, 2.0, KeyframeAction::Disappear),
                keyframe("car", 6.0, 1.0, KeyframeAction::Appear),
            ],
        );
        assert_eq!(opacity(&compute_frame(&data, 1.5, []), "car"), 1.0);
        assert_eq!(opacity(&compute_frame(&data, 3.0, []), "car"), 0.5);
        assert_eq!(opacity(&compute_frame(&data, 5.0, []), "car"), 0.0);
        assert_eq!(opacity(&compute_frame(&data, 9.0, []), "car"), 1.0);
    }

    #[test]
    fn completed_transforms_are_dropped() {
        let mut mv = keyframe("car", 1.0, 2.0, KeyframeAction::Move);
        mv.properties.from_x = Some(0.0);
        mv.properties.to_x = Some(100.0);
        mv.properties.to_y = Some(50.0);
        let data = animation(
            10.0,
            vec![keyframe("car", 0.0, 0.5, KeyframeAction::Appear), mv],
        );

        let moving = compute_frame(&data, 2.0, []);
        let style = moving.get("car").expect("car");
        assert_eq!(style.translate, (50.0, 25.0));
        assert_eq!(style.opacity, 1.0);

        let after = compute_frame(&data, 4.0, []);
        assert_eq!(after.get("car").map(|s| s.translate), Some((0.0, 0.0)));
    }

    #[test]
    fn highlight_sets_glow_and_active_flag() {
        let mut hl = keyframe("door", 1.0, 4.0, KeyframeAction::Highlight);
        hl.properties.color = Some("#ff0000".to_string());
        let data = animation(10.0, vec![hl]);

        let frame = compute_frame(&data, 2.0, []);
        let style = frame.get("door").expect("door");
        assert_eq!(style.glow, 5.0);
        assert!(style.active);
        assert_eq!(style.glow_color.as_deref(), Some("#ff0000"));

        let later = compute_frame(&data, 6.0, []);
        assert!(!later.get("door").expect("door").active);
    }

    #[test]
    fn pulse_peaks_at_quarter_progress() {
        let data = animation(10.0, vec![keyframe("dot", 0.0, 4.0, KeyframeAction::Pulse)]);
        let scale = compute_frame(&data, 1.0, []).get("dot").expect("dot").scale;
        assert!((scale - 1.1).abs() < 1e-12);
        let scale = compute_frame(&data, 2.0, []).get("dot").expect("dot").scale;
        assert!((scale - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_duration_keyframe_jumps_to_full_progress() {
        let data = animation(5.0, vec![keyframe("flash", 1.0, 0.0, KeyframeAction::Appear)]);
        assert_eq!(opacity(&compute_frame(&data, 0.5, []), "flash"), 0.0);
        assert_eq!(opacity(&compute_frame(&data, 1.0, []), "flash"), 1.0);
        assert_eq!(opacity(&compute_frame(&data, 1.5, []), "flash"), 1.0);
    }
}
