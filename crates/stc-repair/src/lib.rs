//! Auto-Repair Loop (C9): compile-error-driven iterative patching.

pub mod patch;
pub mod prompt;

#[path = "loop_.rs"]
pub mod repair_loop;

pub use patch::{apply_patches, parse_patches, Patch};
pub use repair_loop::{auto_fix, RepairError, RepairOutcome};
