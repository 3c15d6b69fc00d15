pub mod client;

pub use casetrail_core;
pub use client::ApiClient;
