//! Planner (C4): cross-file call-site context collection and LLM-driven step
//! plan generation.

pub mod context;
pub mod plan;

pub use context::collect_contexts;
pub use plan::{build_planning_prompt, generate_plan, PlanError};
