//! Run report (§10.4): the Orchestrator's single source of truth for what
//! succeeded, failed, or was skipped in a pipeline invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub name: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    pub fn ok(name: impl Into<String>) -> Self {
        Self { name: name.into(), status: Status::Success, error: None }
    }

    pub fn failed(name: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self { name: name.into(), status: Status::Failed, error: Some(error.to_string()) }
    }

    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { name: name.into(), status: Status::Skipped, error: Some(reason.into()) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    pub task_id: String,
    pub function_name: String,
    pub success: bool,
    pub iterations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectReport {
    pub name: String,
    pub status: Status,
    pub steps: Vec<StepReport>,
    pub cases: Vec<CaseReport>,
}

impl ProjectReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), status: Status::Success, steps: Vec::new(), cases: Vec::new() }
    }

    pub fn push_step(&mut self, step: StepReport) {
        if step.status == Status::Failed {
            self.status = Status::Failed;
        }
        self.steps.push(step);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub projects: Vec<ProjectReport>,
}

impl RunReport {
    /// Overall process exit status: 0 if every project succeeded or was
    /// skipped by filter, 1 if any project failed a stage.
    pub fn any_failed(&self) -> bool {
        self.projects.iter().any(|p| p.status == Status::Failed)
    }

    pub fn write(&self, path: &std::path::Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
