use std::fmt;
use std::time::Duration;

use casetrail_core::validate::{AnimationError, validate_animation};
use casetrail_core::{AnimationBackend, AnimationDataset, BackendError, KeyframeAction};
use casetrail_runtime_config::PlaybackSettings;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::frame::{Frame, compute_frame};
use crate::surface::SceneSurface;

#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum PlaybackError {
    #[error("failed to load animation: {0}")]
    Backend(BackendError),
    #[error("invalid animation: {}", join_errors(.0))]
    Invalid(Vec<AnimationError>),
    #[error("unsupported playback speed: {0}")]
    UnsupportedSpeed(f64),
}

fn join_errors(errors: &[AnimationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Ready,
    Playing,
    Paused,
    Complete,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackSpeed {
    Quarter,
    Half,
    #[default]
    Normal,
    OneAndHalf,
    Double,
}

impl PlaybackSpeed {
    pub const ALL: [PlaybackSpeed; 5] = [
        Self::Quarter,
        Self::Half,
        Self::Normal,
        Self::OneAndHalf,
        Self::Double,
    ];

    pub fn factor(self) -> f64 {
        match self {
            Self::Quarter => 0.25,
            Self::Half => 0.5,
            Self::Normal => 1.0,
            Self::OneAndHalf => 1.5,
            Self::Double => 2.0,
        }
    }

    pub fn from_factor(factor: f64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| (s.factor() - factor).abs() < f64::EPSILON)
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.factor())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Played,
    Paused,
    Seeked(f64),
    Completed,
    SpeedChanged(PlaybackSpeed),
}

/// Position of one keyframe on the progress bar.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeMarker {
    pub index: usize,
    /// Fraction of the total duration, in `[0, 1]`.
    pub position: f64,
    pub element_id: String,
    pub action: KeyframeAction,
}

type Callback = Box<dyn FnMut(&PlaybackEvent) + Send>;

/// Virtual-clock player for one animation dataset.
pub struct PlaybackScheduler<S: SceneSurface> {
    surface: S,
    data: Option<AnimationDataset>,
    state: PlaybackState,
    current_time: f64,
    speed: PlaybackSpeed,
    status: String,
    subscribers: Vec<(usize, Callback)>,
    next_subscriber: usize,
}

impl<S: SceneSurface> PlaybackScheduler<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            data: None,
            state: PlaybackState::Ready,
            current_time: 0.0,
            speed: PlaybackSpeed::Normal,
            status: "No animation loaded".to_string(),
            subscribers: Vec::new(),
            next_subscriber: 0,
        }
    }

    /// Scheduler starting at the configured default speed.
    pub fn with_settings(surface: S, settings: &PlaybackSettings) -> Self {
        let mut scheduler = Self::new(surface);
        scheduler.speed = PlaybackSpeed::from_factor(settings.default_speed).unwrap_or_default();
        scheduler
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn total_duration(&self) -> f64 {
        self.data.as_ref().map_or(0.0, |d| d.total_duration)
    }

    /// Clock position as a fraction of the total duration.
    pub fn progress(&self) -> f64 {
        let total = self.total_duration();
        if total > 0.0 {
            (self.current_time / total).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&AnimationDataset> {
        self.data.as_ref()
    }

    /// Register a callback for state changes. Returns an id for `unsubscribe`.
    pub fn subscribe<F>(&mut self, callback: F) -> usize
    where
        F: FnMut(&PlaybackEvent) + Send + 'static,
    {
        let id = self.next_subscriber;
        self.next_subscriber += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: usize) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    /// Validate and install a dataset, then show its first frame.
    pub fn set_animation_data(&mut self, dataset: AnimationDataset) -> Result<(), PlaybackError> {
        self.data = None;
        self.state = PlaybackState::Ready;
        self.current_time = 0.0;

        if let Err(errors) = validate_animation(&dataset) {
            let err = PlaybackError::Invalid(errors);
            warn!("{err}");
            self.status = err.to_string();
            return Err(err);
        }

        self.status = format!(
            "Ready: {} keyframes, {:.1}s",
            dataset.keyframes.len(),
            dataset.total_duration
        );
        info!(
            keyframes = dataset.keyframes.len(),
            total_duration = dataset.total_duration,
            "animation loaded"
        );
        self.data = Some(dataset);
        self.apply_frame();
        Ok(())
    }

    pub async fn load_animation<B: AnimationBackend>(
        &mut self,
        backend: &B,
        version: &str,
    ) -> Result<(), PlaybackError> {
        self.begin_fetch("Loading animation...");
        let result = backend.fetch_animation(version).await;
        self.finish_fetch(version, result)
    }

    /// Ask the backend to (re)generate keyframes for a scene version.
    pub async fn generate_animation<B: AnimationBackend>(
        &mut self,
        backend: &B,
        version: &str,
    ) -> Result<(), PlaybackError> {
        self.begin_fetch("Generating animation...");
        let result = backend.generate_animation(version).await;
        self.finish_fetch(version, result)
    }

    pub fn play(&mut self) {
        let Some(total) = self.data.as_ref().map(|d| d.total_duration) else {
            debug!("play ignored: no animation data");
            return;
        };
        if self.state == PlaybackState::Playing {
            return;
        }
        if self.current_time >= total {
            self.current_time = 0.0;
            self.apply_frame();
        }
        self.transition(PlaybackState::Playing);
        self.emit(PlaybackEvent::Played);
    }

    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.transition(PlaybackState::Paused);
        self.emit(PlaybackEvent::Paused);
    }

    pub fn toggle(&mut self) {
        if self.state == PlaybackState::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Jump the clock to `t` (clamped) and redraw immediately.
    pub fn seek(&mut self, t: f64) {
        let total = self.total_duration();
        if self.data.is_none() || !t.is_finite() {
            return;
        }
        self.current_time = t.clamp(0.0, total);
        self.apply_frame();
        self.emit(PlaybackEvent::Seeked(self.current_time));
    }

    /// Advance the clock by a wall-clock delta scaled by the current speed.
    /// Returns whether playback is still running.
    pub fn tick(&mut self, wall_delta: Duration) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        let total = self.total_duration();
        self.current_time += wall_delta.as_secs_f64() * self.speed.factor();

        if self.current_time >= total {
            self.current_time = total;
            self.apply_frame();
            self.transition(PlaybackState::Complete);
            self.emit(PlaybackEvent::Completed);
            return false;
        }
        self.apply_frame();
        true
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        if self.speed == speed {
            return;
        }
        self.speed = speed;
        debug!(%speed, "playback speed changed");
        self.emit(PlaybackEvent::SpeedChanged(speed));
    }

    pub fn set_speed_factor(&mut self, factor: f64) -> Result<(), PlaybackError> {
        let speed = PlaybackSpeed::from_factor(factor).ok_or(PlaybackError::UnsupportedSpeed(factor))?;
        self.set_speed(speed);
        Ok(())
    }

    pub fn current_frame(&self) -> Option<Frame> {
        let data = self.data.as_ref()?;
        let known = self.surface.element_ids();
        Some(compute_frame(
            data,
            self.current_time,
            known.iter().map(String::as_str),
        ))
    }

    pub fn keyframe_markers(&self) -> Vec<KeyframeMarker> {
        let Some(data) = &self.data else {
            return Vec::new();
        };
        data.keyframes
            .iter()
            .enumerate()
            .map(|(index, kf)| KeyframeMarker {
                index,
                position: if data.total_duration > 0.0 {
                    (kf.time_offset / data.total_duration).clamp(0.0, 1.0)
                } else {
                    0.0
                },
                element_id: kf.element_id.clone(),
                action: kf.action,
            })
            .collect()
    }

    /// Hover text for a progress-bar marker.
    pub fn marker_tooltip(&self, index: usize) -> Option<String> {
        let kf = self.data.as_ref()?.keyframes.get(index)?;
        Some(format!(
            "{} {} at {:.1}s for {:.1}s",
            kf.action, kf.element_id, kf.time_offset, kf.duration
        ))
    }

    /// Drop data and subscribers; every control becomes a no-op until new
    /// data is set.
    pub fn destroy(&mut self) {
        self.data = None;
        self.subscribers.clear();
        self.state = PlaybackState::Ready;
        self.current_time = 0.0;
        self.status = "No animation loaded".to_string();
    }

    fn begin_fetch(&mut self, status: &str) {
        self.data = None;
        self.state = PlaybackState::Ready;
        self.current_time = 0.0;
        self.status = status.to_string();
    }

    fn finish_fetch(
        &mut self,
        version: &str,
        result: Result<AnimationDataset, BackendError>,
    ) -> Result<(), PlaybackError> {
        match result {
            Ok(dataset) => self.set_animation_data(dataset),
            Err(err) => {
                warn!(version, "animation request failed: {err}");
                let err = PlaybackError::Backend(err);
                self.status = err.to_string();
                Err(err)
            }
        }
    }

    fn transition(&mut self, next: PlaybackState) {
        debug!(from = %self.state, to = %next, t = self.current_time, "playback state");
        self.state = next;
    }

    fn apply_frame(&mut self) {
        let Some(frame) = self.current_frame() else {
            return;
        };
        for (id, style) in &frame.elements {
            self.surface.apply(id, style);
        }
    }

    fn emit(&mut self, event: PlaybackEvent) {
        for (_, callback) in &mut self.subscribers {
            callback(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SceneState;
    use casetrail_core::testing::{FakeBackend, animation, keyframe};
    use std::sync::{Arc, Mutex};

    fn scene_data() -> AnimationDataset {
        let mut mv = keyframe("car", 3.0, 4.0, KeyframeAction::Move);
        mv.properties.to_x = Some(80.0);
        animation(
            10.0,
            vec![
                keyframe("a", 2.0, 2.0, KeyframeAction::Appear),
                keyframe("car", 2.5, 1.0, KeyframeAction::Appear),
                mv,
                keyframe("a", 5.0, 2.0, KeyframeAction::Highlight),
                keyframe("a", 7.5, 1.0, KeyframeAction::Disappear),
            ],
        )
    }

    fn scheduler() -> PlaybackScheduler<SceneState> {
        let mut s = PlaybackScheduler::new(SceneState::with_elements(["tree"]));
        s.set_animation_data(scene_data()).expect("valid data");
        s
    }

    fn recorder(s: &mut PlaybackScheduler<SceneState>) -> Arc<Mutex<Vec<PlaybackEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        s.subscribe(move |event| sink.lock().expect("lock").push(event.clone()));
        events
    }

    #[test]
    fn opacity_follows_clock_while_playing() {
        let mut s = PlaybackScheduler::new(SceneState::new());
        s.set_animation_data(animation(10.0, vec![keyframe("a", 2.0, 2.0, KeyframeAction::Appear)]))
            .expect("valid");
        s.play();
        for (step, expected) in [(1.0, 0.0), (2.0, 0.5), (2.0, 1.0), (3.0, 1.0)] {
            s.tick(Duration::from_secs_f64(step));
            assert_eq!(s.surface().opacity("a"), expected, "at t={}", s.current_time());
        }
    }

    #[test]
    fn seek_and_play_produce_identical_frames() {
        let mut played = scheduler();
        played.play();
        for _ in 0..12 {
            played.tick(Duration::from_millis(500));
        }
        assert_eq!(played.current_time(), 6.0);

        let mut sought = scheduler();
        sought.seek(9.0);
        sought.seek(6.0);

        assert_eq!(played.current_frame(), sought.current_frame());
        assert_eq!(played.surface().elements, sought.surface().elements);
    }

    #[test]
    fn surface_elements_without_keyframes_are_reset() {
        let s = scheduler();
        assert_eq!(s.surface().opacity("tree"), 0.0);
        assert!(s.surface().applied >= 3);
    }

    #[test]
    fn completion_fires_once_and_play_restarts_from_zero() {
        let mut s = scheduler();
        let events = recorder(&mut s);
        s.set_speed(PlaybackSpeed::Double);
        s.play();

        assert!(s.tick(Duration::from_secs(3)));
        assert!(!s.tick(Duration::from_secs(3)));
        assert!(!s.tick(Duration::from_secs(3)));
        assert_eq!(s.state(), PlaybackState::Complete);
        assert_eq!(s.current_time(), 10.0);

        let completed = events
            .lock()
            .expect("lock")
            .iter()
            .filter(|e| **e == PlaybackEvent::Completed)
            .count();
        assert_eq!(completed, 1);

        s.play();
        assert_eq!(s.state(), PlaybackState::Playing);
        assert_eq!(s.current_time(), 0.0);
        assert_eq!(s.surface().opacity("a"), 0.0);
    }

    #[test]
    fn pause_freezes_clock_and_resume_continues() {
        let mut s = scheduler();
        let events = recorder(&mut s);
        s.play();
        s.tick(Duration::from_secs(1));
        s.pause();
        assert!(!s.tick(Duration::from_secs(5)));
        assert_eq!(s.current_time(), 1.0);
        s.play();
        s.tick(Duration::from_secs(1));
        assert_eq!(s.current_time(), 2.0);

        assert_eq!(
            *events.lock().expect("lock"),
            vec![PlaybackEvent::Played, PlaybackEvent::Paused, PlaybackEvent::Played]
        );
    }

    #[test]
    fn seek_clamps_in_any_state() {
        let mut s = scheduler();
        let events = recorder(&mut s);
        s.seek(-4.0);
        assert_eq!(s.current_time(), 0.0);
        s.seek(42.0);
        assert_eq!(s.current_time(), 10.0);
        assert_eq!(s.state(), PlaybackState::Ready);
        s.seek(f64::NAN);
        assert_eq!(s.current_time(), 10.0);
        assert_eq!(
            *events.lock().expect("lock"),
            vec![PlaybackEvent::Seeked(0.0), PlaybackEvent::Seeked(10.0)]
        );
    }

    #[test]
    fn speed_changes_apply_mid_playback() {
        let mut s = scheduler();
        s.play();
        s.tick(Duration::from_secs(1));
        s.set_speed_factor(0.5).expect("supported");
        s.tick(Duration::from_secs(2));
        assert_eq!(s.current_time(), 2.0);
        assert_eq!(
            s.set_speed_factor(3.0),
            Err(PlaybackError::UnsupportedSpeed(3.0))
        );
        assert_eq!(s.speed(), PlaybackSpeed::Half);
    }

    #[test]
    fn controls_without_data_are_no_ops() {
        let mut s = PlaybackScheduler::new(SceneState::with_elements(["tree"]));
        let events = recorder(&mut s);
        s.play();
        s.seek(3.0);
        assert!(!s.tick(Duration::from_secs(1)));
        assert_eq!(s.state(), PlaybackState::Ready);
        assert!(events.lock().expect("lock").is_empty());
        assert!(s.keyframe_markers().is_empty());
        assert_eq!(s.surface().applied, 0);
    }

    #[test]
    fn out_of_order_keyframes_are_rejected() {
        let mut s = PlaybackScheduler::new(SceneState::new());
        let err = s
            .set_animation_data(animation(
                10.0,
                vec![
                    keyframe("a", 5.0, 1.0, KeyframeAction::Appear),
                    keyframe("b", 1.0, 1.0, KeyframeAction::Appear),
                ],
            ))
            .expect_err("should reject");
        assert_eq!(
            err,
            PlaybackError::Invalid(vec![AnimationError::KeyframesOutOfOrder { index: 1 }])
        );
        assert!(!s.has_data());
        assert!(s.status().starts_with("invalid animation"));
    }

    #[test]
    fn markers_and_tooltips() {
        let s = scheduler();
        let markers = s.keyframe_markers();
        assert_eq!(markers.len(), 5);
        assert_eq!(markers[0].position, 0.2);
        assert_eq!(markers[2].action, KeyframeAction::Move);
        assert_eq!(
            s.marker_tooltip(2).as_deref(),
            Some("move car at 3.0s for 4.0s")
        );
        assert_eq!(s.marker_tooltip(9), None);
    }

    #[test]
    fn destroy_drops_data_and_subscribers() {
        let mut s = scheduler();
        let events = recorder(&mut s);
        s.destroy();
        s.play();
        assert!(!s.has_data());
        assert!(events.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn load_failure_leaves_nothing_playable() {
        let backend = FakeBackend::with_animation(scene_data());
        let mut s = PlaybackScheduler::new(SceneState::new());
        s.load_animation(&backend, "v1").await.expect("load");
        assert!(s.has_data());
        assert!(s.status().starts_with("Ready: 5 keyframes"));

        backend.state().read_error = Some(BackendError::Status {
            status: 404,
            body: "no such version".to_string(),
        });
        let err = s.generate_animation(&backend, "v2").await.expect_err("fail");
        assert!(matches!(err, PlaybackError::Backend(_)));
        assert!(!s.has_data());
        assert_eq!(s.status(), "failed to load animation: 404: no such version");
        s.play();
        assert_eq!(s.state(), PlaybackState::Ready);
        assert_eq!(backend.calls(), vec!["GET animation v1", "POST generate v2"]);
    }

    #[test]
    fn toggle_alternates_and_progress_tracks_clock() {
        let mut s = scheduler();
        assert_eq!(s.progress(), 0.0);
        s.toggle();
        assert_eq!(s.state(), PlaybackState::Playing);
        s.tick(Duration::from_millis(2500));
        assert_eq!(s.progress(), 0.25);
        s.toggle();
        assert_eq!(s.state(), PlaybackState::Paused);
        s.toggle();
        s.tick(Duration::from_secs(30));
        assert_eq!(s.state(), PlaybackState::Complete);
        assert_eq!(s.progress(), 1.0);
    }

    #[test]
    fn unsubscribed_callbacks_stop_receiving_events() {
        let mut s = scheduler();
        let kept = recorder(&mut s);
        let dropped = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&dropped);
        let id = s.subscribe(move |_| *counter.lock().expect("lock") += 1);

        s.play();
        s.unsubscribe(id);
        s.pause();

        assert_eq!(*dropped.lock().expect("lock"), 1);
        assert_eq!(
            *kept.lock().expect("lock"),
            vec![PlaybackEvent::Played, PlaybackEvent::Paused]
        );
    }

    #[test]
    fn surface_is_handed_back_with_last_frame() {
        let mut s = scheduler();
        assert_eq!(s.data().map(|d| d.keyframes.len()), Some(5));
        s.seek(3.0);

        let scene = s.into_surface();
        assert_eq!(scene.opacity("a"), 0.5);
        assert_eq!(scene.opacity("tree"), 0.0);
    }

    #[test]
    fn speed_steps_match_configurable_speeds() {
        let factors: Vec<f64> = PlaybackSpeed::ALL.iter().map(|s| s.factor()).collect();
        assert_eq!(factors, casetrail_runtime_config::SUPPORTED_SPEEDS);
    }

    #[test]
    fn default_speed_comes_from_settings() {
        let settings = PlaybackSettings {
            default_speed: 1.5,
            ..PlaybackSettings::default()
        };
        let s = PlaybackScheduler::with_settings(SceneState::new(), &settings);
        assert_eq!(s.speed(), PlaybackSpeed::OneAndHalf);
        assert_eq!(s.speed().to_string(), "1.5x");
    }
}
