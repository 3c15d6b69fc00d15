use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::scheduler::{PlaybackScheduler, PlaybackState};
use crate::surface::SceneSurface;

/// Shortest frame interval the loop will tick at.
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLoopExit {
    /// Playback reached the end of the animation.
    Completed,
    /// Playback was paused or never started.
    Stopped,
    Shutdown,
}

/// Drive `scheduler` at `frame_interval` until playback stops or `shutdown`
/// turns true. A dropped shutdown sender counts as shutdown.
///
/// Intervals shorter than [`MIN_FRAME_INTERVAL`] are raised to it.
pub async fn run_frame_loop<S: SceneSurface>(
    scheduler: &mut PlaybackScheduler<S>,
    frame_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> FrameLoopExit {
    let mut ticker = tokio::time::interval(frame_interval.max(MIN_FRAME_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();
    let mut frames = 0u64;

    let exit = loop {
        if *shutdown.borrow() {
            break FrameLoopExit::Shutdown;
        }
        match scheduler.state() {
            PlaybackState::Playing => {}
            PlaybackState::Complete => break FrameLoopExit::Completed,
            PlaybackState::Ready | PlaybackState::Paused => break FrameLoopExit::Stopped,
        }

        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                let delta = now.saturating_duration_since(last);
                last = now;
                frames += 1;
                scheduler.tick(delta);
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break FrameLoopExit::Shutdown;
                }
            }
        }
    };

    debug!(frames, t = scheduler.current_time(), "frame loop finished");
    if exit == FrameLoopExit::Shutdown {
        info!("playback interrupted by shutdown");
    }
    exit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::PlaybackEvent;
    use crate::surface::SceneState;
    use casetrail_core::KeyframeAction;
    use casetrail_core::testing::{animation, keyframe};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn short_scheduler(total: f64) -> PlaybackScheduler<SceneState> {
        let mut s = PlaybackScheduler::new(SceneState::new());
        s.set_animation_data(animation(total, vec![keyframe("a", 0.0, 0.5, KeyframeAction::Appear)]))
            .expect("valid");
        s
    }

    #[tokio::test(start_paused = true)]
    async fn runs_to_completion_and_reports_once() {
        let mut s = short_scheduler(1.0);
        let completions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&completions);
        s.subscribe(move |event| {
            if *event == PlaybackEvent::Completed {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        s.play();

        let (_tx, rx) = watch::channel(false);
        let exit = run_frame_loop(&mut s, Duration::from_millis(16), rx).await;

        assert_eq!(exit, FrameLoopExit::Completed);
        assert_eq!(s.current_time(), 1.0);
        assert_eq!(s.surface().opacity("a"), 1.0);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_playback() {
        let mut s = short_scheduler(100.0);
        s.play();
        let (tx, rx) = watch::channel(false);

        let stop = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            let _ = tx.send(true);
        };
        let (exit, ()) = tokio::join!(run_frame_loop(&mut s, Duration::from_millis(16), rx), stop);

        assert_eq!(exit, FrameLoopExit::Shutdown);
        assert_eq!(s.state(), PlaybackState::Playing);
        assert!(s.current_time() > 0.0 && s.current_time() < 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_is_raised_to_the_minimum() {
        let mut s = short_scheduler(0.5);
        s.play();
        let (_tx, rx) = watch::channel(false);

        let exit = run_frame_loop(&mut s, Duration::ZERO, rx).await;

        assert_eq!(exit, FrameLoopExit::Completed);
        assert_eq!(s.current_time(), 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn not_playing_returns_immediately() {
        let mut s = short_scheduler(1.0);
        let (_tx, rx) = watch::channel(false);
        let exit = run_frame_loop(&mut s, Duration::from_millis(16), rx).await;
        assert_eq!(exit, FrameLoopExit::Stopped);
        assert_eq!(s.current_time(), 0.0);
    }
}
