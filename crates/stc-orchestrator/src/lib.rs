//! Orchestrator (C11): drives the retrieve/plan/generate/repair/evaluate
//! pipeline across projects and persists the run report.

pub mod pipeline;
pub mod report;
pub mod run;

pub use pipeline::{case_from_query, run_case, strip_provide_code, ProjectPaths};
pub use report::{CaseReport, ProjectReport, RunReport, Status, StepReport};
pub use run::{run, OrchestratorError, RunConfig};
