// src/lib.rs
// Public library surface for the service binary and integration tests.

pub mod analyze;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod rate_limit;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::cache::{AdminAccess, PublishedCache};
pub use crate::config::AppConfig;
pub use crate::error::PulseError;
pub use crate::ingest::types::{Headline, RawHeadline, SourceProvider};
pub use crate::notify::{AlertPayload, NotifierMux};
pub use crate::pipeline::{CycleState, Orchestrator};
