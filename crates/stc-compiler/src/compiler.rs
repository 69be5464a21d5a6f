//! Compiler Client (C7): HTTP client for the remote CODESYS compile service,
//! with the error-line resolution algorithm that turns a relative `Path`
//! offset back into an absolute source line.

use serde::{Deserialize, Serialize};
use stc_core::{CompileError, CompileResponse, ErrorKind};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct CompileRequest<'a> {
    path: &'a str,
    #[serde(rename = "BlockName")]
    block_name: &'a str,
    #[serde(rename = "Code")]
    code: &'a str,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(rename = "Success")]
    success: bool,
    #[serde(rename = "Result")]
    result: String,
    #[serde(rename = "Errors")]
    errors: Vec<RawError>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    #[serde(rename = "ErrorDesc")]
    error_desc: String,
    #[serde(rename = "IsDef")]
    is_def: bool,
    #[serde(rename = "Path")]
    path: i64,
}

const SYNTHETIC_FAILURE_DESC: &str = "compile service call failed";

fn synthetic_failure() -> CompileResponse {
    CompileResponse {
        success: false,
        result: SYNTHETIC_FAILURE_DESC.to_string(),
        errors: vec![CompileError {
            error_desc: SYNTHETIC_FAILURE_DESC.to_string(),
            error_type: ErrorKind::System,
            line_no: 0,
            line_content: String::new(),
            code_window: String::new(),
        }],
    }
}

/// Locate the base line used to resolve a relative error `Path`: the first
/// line whose trimmed content is exactly `BEGIN`, or failing that, the line
/// after the *last* `END_VAR`.
fn resolve_base_line(lines: &[&str]) -> usize {
    if let Some(idx) = lines.iter().position(|l| l.trim() == "BEGIN") {
        return idx;
    }
    match lines.iter().rposition(|l| l.trim() == "END_VAR") {
        Some(idx) => idx + 1,
        None => 0,
    }
}

/// ±3 source lines around `absolute_line` (0-based), each prefixed with its
/// 1-based line number padded to 4 characters.
fn extract_code_window(lines: &[&str], absolute_line: usize, window: usize) -> String {
    let start = absolute_line.saturating_sub(window);
    let end = (absolute_line + window + 1).min(lines.len());
    if start >= lines.len() {
        return String::new();
    }
    lines[start..end]
        .iter()
        .enumerate()
        .map(|(offset, line)| format!("{:>4}: {}", start + offset + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalize_error(raw: RawError, lines: &[&str]) -> CompileError {
    let base = if raw.is_def { 0 } else { resolve_base_line(lines) };
    let absolute_line = (base as i64 + raw.path).max(0) as usize;

    let line_content = lines.get(absolute_line).map(|s| s.to_string()).unwrap_or_default();
    let code_window = extract_code_window(lines, absolute_line, 3);

    CompileError {
        error_desc: raw.error_desc,
        error_type: if raw.is_def { ErrorKind::Declaration } else { ErrorKind::Implementation },
        line_no: raw.path,
        line_content,
        code_window,
    }
}

pub struct CompilerClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl CompilerClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout_secs: u64) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("building reqwest client");
        Self { http, endpoint: endpoint.into(), api_key: api_key.into() }
    }

    /// POST `{path, BlockName, Code}` to the compile service; normalize the
    /// response. Connect timeouts, connection errors, and non-200 responses
    /// all collapse to the single synthetic system-error response.
    pub fn syntax_check(&self, project_path: &str, block_name: &str, st_code: &str) -> CompileResponse {
        let url = format!("{}/api/v1/pou/workflow", self.endpoint.trim_end_matches('/'));
        let body = CompileRequest { path: project_path, block_name, code: st_code };

        let send_once = || -> Result<RawResponse, reqwest::Error> {
            self.http
                .post(&url)
                .header("Authorization", format!("ApiKey {}", self.api_key))
                .json(&body)
                .send()?
                .error_for_status()?
                .json::<RawResponse>()
        };

        let result = match send_once() {
            Ok(raw) => Ok(raw),
            Err(e) if e.status().map(|s| s.as_u16()) == Some(429) => send_once(),
            Err(e) => Err(e),
        };

        match result {
            Ok(raw) => {
                let lines: Vec<&str> = st_code.lines().collect();
                CompileResponse {
                    success: raw.success,
                    result: raw.result,
                    errors: raw.errors.into_iter().map(|e| normalize_error(e, &lines)).collect(),
                }
            }
            Err(_) => synthetic_failure(),
        }
    }
}
