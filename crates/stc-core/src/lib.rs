//! Shared data model, error taxonomy, and observability primitives used across
//! the retrieval/plan/generate/repair/evaluate pipeline.

pub mod config;
pub mod model;
pub mod observer;
pub mod sanitize;

pub use config::PipelineConfig;
pub use model::*;
pub use observer::{shared as shared_observer, EventKind, Observer, ObserverEvent};

/// Common result alias; component-specific error enums implement `std::error::Error`
/// and convert into this via `?`.
pub type Result<T> = anyhow::Result<T>;
