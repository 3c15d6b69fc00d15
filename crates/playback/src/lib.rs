//! Keyframe playback against a virtual clock.
//!
//! [`PlaybackScheduler`] owns the clock and the dataset; each frame is
//! computed by [`frame::compute_frame`] and pushed to a [`SceneSurface`].
//! [`run_frame_loop`] drives a playing scheduler from a tokio interval.

pub mod frame;
pub mod frame_loop;
pub mod scheduler;
pub mod surface;

pub use frame::{ElementStyle, Frame, compute_frame};
pub use frame_loop::{FrameLoopExit, run_frame_loop};
pub use scheduler::{
    KeyframeMarker, PlaybackError, PlaybackEvent, PlaybackScheduler, PlaybackSpeed, PlaybackState,
};
pub use surface::{SceneState, SceneSurface};
