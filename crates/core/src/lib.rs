pub mod animation;
pub mod backend;
pub mod clarified;
pub mod time_model;
pub mod timeline;
pub mod validate;

pub use animation::*;
pub use backend::{AnimationBackend, BackendError, TimelineBackend};
pub use clarified::*;
pub use timeline::*;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
