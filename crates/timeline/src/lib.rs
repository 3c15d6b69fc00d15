//! Swim-lane timeline for multi-witness event data.
//!
//! [`layout::layout_timeline`] turns a dataset into geometry; [`TimelineView`]
//! owns the interaction state and draws through a [`RenderTarget`].

pub mod clarification;
pub mod detail;
pub mod layout;
pub mod render;
pub mod view;
pub mod view_state;

pub use clarification::{ClarificationDialog, ClarificationWorkflow, ClarifyError, ClaritySummary};
pub use detail::EventDetail;
pub use layout::{TimelineLayout, layout_timeline};
pub use render::{RecordingTarget, RenderTarget, TextTarget};
pub use view::{EditError, TimelineView};
pub use view_state::{PanOffset, ViewState};
