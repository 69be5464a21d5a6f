//! Auto-Repair Loop (C9): bounded compile → classify → patch → apply state
//! machine, with conversation retention and per-iteration history snapshots.

use crate::patch::{apply_patches, parse_patches};
use crate::prompt::{build_repair_user_prompt, REPAIR_SYSTEM_PROMPT};
use stc_compiler::{recommend, render_section, CompilerClient};
use stc_core::{ChatMessage, ErrorKind};
use stc_llm::{LlmClient, LlmError};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepairError {
    #[error("could not read {0}: {1}")]
    Read(std::path::PathBuf, std::io::Error),
    #[error("could not write {0}: {1}")]
    Write(std::path::PathBuf, std::io::Error),
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Result of running the Auto-Repair Loop to completion.
pub struct RepairOutcome {
    pub final_code: String,
    pub success: bool,
    pub iterations: u32,
}

/// Select errors to send to the LLM: Declaration Section errors take strict
/// precedence (they commonly cascade into spurious Implementation errors); if
/// none exist, all Implementation Section errors are sent.
fn select_errors(errors: &[stc_core::CompileError]) -> Vec<&stc_core::CompileError> {
    let declaration: Vec<_> = errors.iter().filter(|e| e.error_type == ErrorKind::Declaration).collect();
    if !declaration.is_empty() {
        declaration
    } else {
        errors.iter().filter(|e| e.error_type == ErrorKind::Implementation).collect()
    }
}

fn write_snapshot(history_dir: &Path, function_name: &str, iteration: u32, code: &str) -> Result<(), RepairError> {
    std::fs::create_dir_all(history_dir).map_err(|e| RepairError::Write(history_dir.to_path_buf(), e))?;
    let path = history_dir.join(format!("{function_name}_{iteration}.st"));
    std::fs::write(&path, code).map_err(|e| RepairError::Write(path, e))
}

/// Run the bounded repair loop for one case's post-processed file.
///
/// `project_path` is the CODESYS `.project` path (or equivalent identifier)
/// passed straight through to [`CompilerClient::syntax_check`]; `block_name`
/// and `function_name` are the same target name, kept distinct because the
/// wire protocol and the history-file convention name it differently.
pub fn auto_fix(
    file_path: &Path,
    project_path: &str,
    block_name: &str,
    function_name: &str,
    max_verify_count: u32,
    compiler: &CompilerClient,
    llm: &dyn LlmClient,
    history_dir: &Path,
    infos_dir: Option<&Path>,
) -> Result<RepairOutcome, RepairError> {
    let mut code =
        std::fs::read_to_string(file_path).map_err(|e| RepairError::Read(file_path.to_path_buf(), e))?;
    let mut n: u32 = 0;
    let mut messages = vec![ChatMessage::system(REPAIR_SYSTEM_PROMPT)];

    loop {
        let resp = compiler.syntax_check(project_path, block_name, &code);

        // `n` only counts patches already applied, not the compile attempt in
        // flight, so a success or system error on this attempt is reported as
        // attempt `n + 1` — keeps the first-attempt case at iterations == 1
        // instead of 0.
        if resp.success {
            return Ok(RepairOutcome { final_code: code, success: true, iterations: n + 1 });
        }

        if resp.errors.iter().any(|e| e.error_type == ErrorKind::System) {
            return Ok(RepairOutcome { final_code: code, success: false, iterations: n + 1 });
        }

        if n >= max_verify_count {
            return Ok(RepairOutcome { final_code: code, success: false, iterations: n });
        }

        let selected: Vec<stc_core::CompileError> = select_errors(&resp.errors).into_iter().cloned().collect();
        let library_section = infos_dir.map(|dir| recommend(&selected, dir)).and_then(|recs| render_section(&recs));

        let user_prompt = build_repair_user_prompt(&code, &selected, library_section.as_deref());
        messages.push(ChatMessage::user(user_prompt));

        let reply = llm.complete_chat(&messages)?;
        messages.push(ChatMessage::assistant(reply.clone()));

        let patches = parse_patches(&reply);
        code = apply_patches(&code, &patches);

        write_snapshot(history_dir, function_name, n, &code)?;
        std::fs::write(file_path, &code).map_err(|e| RepairError::Write(file_path.to_path_buf(), e))?;

        n += 1;
    }
}
