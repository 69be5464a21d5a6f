//! Generator (C5) and Post-Processor (C6).

pub mod generate;
pub mod postprocess;
pub mod prompt;

pub use generate::{generate_candidates, GenerateError};
pub use postprocess::{is_idempotent_noop, postprocess_candidate, PostProcessError};
