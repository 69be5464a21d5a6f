//! Plain-eprintln + append-only JSON-line logging, matching the rest of the
//! pipeline's ambient stack. Deliberately does not pull in a tracing crate:
//! every event is a flat record describing one pipeline step.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ProjectStarted,
    ProjectFinished,
    CaseStarted,
    CaseFinished,
    RetrieveDone,
    PlanDone,
    GenerateDone,
    RepairDone,
    EvaluateDone,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverEvent {
    pub kind: EventKind,
    pub timestamp: chrono::DateTime<Utc>,
    pub project: Option<String>,
    pub case: Option<String>,
    pub duration_ms: Option<u64>,
    pub message: String,
}

/// Collects pipeline events: prints a human line to stderr, appends a JSON line
/// to a log file, and optionally fires an HTTP telemetry POST on a detached thread.
pub struct Observer {
    log_path: PathBuf,
    telemetry: Option<Sender<ObserverEvent>>,
}

impl Observer {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self { log_path: log_path.into(), telemetry: None }
    }

    /// Spawn a background thread that POSTs each event to `telemetry_url`.
    /// Send failures are swallowed; telemetry never blocks or fails a run.
    pub fn with_telemetry(mut self, telemetry_url: impl Into<String>) -> Self {
        let url = telemetry_url.into();
        let (tx, rx) = channel::<ObserverEvent>();
        std::thread::spawn(move || {
            let client = reqwest::blocking::Client::new();
            for event in rx {
                let _ = client.post(&url).json(&event).send();
            }
        });
        self.telemetry = Some(tx);
        self
    }

    pub fn emit(&self, event: ObserverEvent) {
        eprintln!(
            "[{}] {:?} {}{}",
            event.timestamp.format("%H:%M:%S"),
            event.kind,
            event.project.as_deref().unwrap_or(""),
            if event.message.is_empty() { String::new() } else { format!(" - {}", event.message) }
        );

        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.log_path) {
            if let Ok(line) = serde_json::to_string(&event) {
                let _ = writeln!(f, "{line}");
            }
        }

        if let Some(tx) = &self.telemetry {
            let _ = tx.send(event);
        }
    }

    pub fn info(&self, kind: EventKind, project: Option<&str>, case: Option<&str>, message: impl Into<String>) {
        self.emit(ObserverEvent {
            kind,
            timestamp: Utc::now(),
            project: project.map(str::to_string),
            case: case.map(str::to_string),
            duration_ms: None,
            message: message.into(),
        });
    }

    pub fn timed(
        &self,
        kind: EventKind,
        project: Option<&str>,
        case: Option<&str>,
        duration_ms: u64,
        message: impl Into<String>,
    ) {
        self.emit(ObserverEvent {
            kind,
            timestamp: Utc::now(),
            project: project.map(str::to_string),
            case: case.map(str::to_string),
            duration_ms: Some(duration_ms),
            message: message.into(),
        });
    }
}

pub fn shared(log_path: impl AsRef<Path>) -> Arc<Observer> {
    Arc::new(Observer::new(log_path.as_ref().to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_jsonl_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("pipeline.log.jsonl");
        let observer = Observer::new(&log_path);
        observer.info(EventKind::ProjectStarted, Some("counter"), None, "starting");
        observer.info(EventKind::ProjectFinished, Some("counter"), None, "done");

        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("project_started"));
    }
}
