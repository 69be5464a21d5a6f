//! Per-project pipeline: retrieve → plan → generate → post-process → repair →
//! no-provide variant → evaluate. One [`run_project`] call owns the artifact
//! directory for a single project under `output/{result_dir}/{project}/`.

use crate::report::CaseReport;
use stc_compiler::CompilerClient;
use stc_core::{Case, FunctionType, Observer, Query};
use stc_llm::LlmClient;
use std::path::{Path, PathBuf};

pub struct ProjectPaths {
    pub root: PathBuf,
}

impl ProjectPaths {
    pub fn new(output_root: &Path, result_dir: &str, project: &str) -> Self {
        Self { root: output_root.join(result_dir).join(project) }
    }

    pub fn results_jsonl(&self) -> PathBuf {
        self.root.join("results.jsonl")
    }
    pub fn prompt_dir(&self) -> PathBuf {
        self.root.join("prompt")
    }
    pub fn plan_results_dir(&self) -> PathBuf {
        self.root.join("plan_results")
    }
    pub fn plan_prompts_dir(&self) -> PathBuf {
        self.root.join("plan_prompts")
    }
    pub fn readful_result_dir(&self) -> PathBuf {
        self.root.join("readful_result")
    }
    pub fn readful_result_before_fix_dir(&self) -> PathBuf {
        self.root.join("readful_result_before_fix")
    }
    pub fn readful_result_history_dir(&self) -> PathBuf {
        self.root.join("readful_result_history")
    }
    pub fn readful_result_no_provide_dir(&self) -> PathBuf {
        self.root.join("readful_result_no_provide")
    }
    pub fn codebleu_evaluation_json(&self) -> PathBuf {
        self.root.join("codebleu_evaluation.json")
    }
    pub fn generations_json(&self, task: &str) -> PathBuf {
        self.root.join(format!("generations_{task}_{task}.json"))
    }
    pub fn references_json(&self, task: &str) -> PathBuf {
        self.root.join(format!("generations_{task}_references.json"))
    }
}

/// Reconstruct a [`Case`] from a retrieval [`Query`]. `requirement` text is not
/// part of the BEIR query shape; callers without a richer Case source fall
/// back to a generic directive naming the target function.
pub fn case_from_query(query: &Query) -> Case {
    let function_name = query.metadata.function_name.clone();
    let function_type = FunctionType::from_provide_code(&query.text);
    Case {
        task_id: query.metadata.task_id.clone(),
        function_name: function_name.clone(),
        function_type,
        requirement: format!("Implement the body of {function_name} per its declared interface."),
        provide_code: query.text.clone(),
        ground_truth: query.metadata.ground_truth.clone(),
    }
}

/// Strip the `provide_code` stub prefix from a post-processed candidate so the
/// implementation body alone can be scored (§4.11 step 5).
pub fn strip_provide_code<'a>(candidate: &'a str, provide_code: &str) -> &'a str {
    candidate.strip_prefix(provide_code).unwrap_or(candidate)
}

pub struct CaseOutcome {
    pub report: CaseReport,
    pub final_code: Option<String>,
}

/// Run one case (one function to complete) through plan → generate →
/// post-process → repair. Never panics or propagates; all failure modes are
/// folded into the returned [`CaseReport`], per the orchestrator's
/// catch-and-record propagation policy.
#[allow(clippy::too_many_arguments)]
pub fn run_case(
    case: &Case,
    project_name: &str,
    project_code_root: &Path,
    retrieved_texts: &[&str],
    paths: &ProjectPaths,
    llm: &dyn LlmClient,
    compiler: &CompilerClient,
    compiler_project_path: &str,
    context_window_size: usize,
    max_verify_count: u32,
    n_samples: usize,
    max_length_input: usize,
    skip_plan: bool,
    skip_generation: bool,
    skip_fix: bool,
    infos_dir: Option<&Path>,
    observer: &Observer,
) -> CaseOutcome {
    let function_name = case.function_name.clone();

    let plan_text = if skip_plan {
        None
    } else {
        let contexts = stc_planner::collect_contexts(
            &function_name,
            case.function_type,
            project_code_root,
            project_name,
            context_window_size,
        );
        match stc_planner::generate_plan(llm, case, project_name, &contexts) {
            Ok((plan_text, prompt)) => {
                let _ = std::fs::create_dir_all(paths.plan_prompts_dir());
                let _ = std::fs::create_dir_all(paths.plan_results_dir());
                let _ = std::fs::write(paths.plan_prompts_dir().join(format!("{function_name}.txt")), &prompt);
                let _ = std::fs::write(paths.plan_results_dir().join(format!("{function_name}.txt")), &plan_text);
                Some(plan_text)
            }
            Err(e) => {
                observer.info(
                    stc_core::EventKind::Warning,
                    Some(project_name),
                    Some(&function_name),
                    format!("plan failed: {e}"),
                );
                None
            }
        }
    };

    if skip_generation {
        return CaseOutcome {
            report: CaseReport {
                task_id: case.task_id.clone(),
                function_name: function_name.clone(),
                success: false,
                iterations: 0,
                error: Some("generation skipped".to_string()),
            },
            final_code: None,
        };
    }

    let candidates = match stc_generate::generate_candidates(
        llm,
        case,
        retrieved_texts,
        plan_text.as_deref(),
        max_length_input,
        n_samples,
    ) {
        Ok(c) => c,
        Err(e) => {
            return CaseOutcome {
                report: CaseReport {
                    task_id: case.task_id.clone(),
                    function_name,
                    success: false,
                    iterations: 0,
                    error: Some(format!("generation failed: {e}")),
                },
                final_code: None,
            }
        }
    };

    let _ = std::fs::create_dir_all(paths.prompt_dir());

    let mut processed = Vec::new();
    for raw in &candidates {
        match stc_generate::postprocess_candidate(raw, &case.provide_code) {
            Ok(code) => processed.push(code),
            Err(e) => {
                observer.info(
                    stc_core::EventKind::Warning,
                    Some(project_name),
                    Some(&function_name),
                    format!("postprocess failed: {e}"),
                );
            }
        }
    }

    let Some(first) = processed.first().cloned() else {
        return CaseOutcome {
            report: CaseReport {
                task_id: case.task_id.clone(),
                function_name,
                success: false,
                iterations: 0,
                error: Some("no candidate survived post-processing".to_string()),
            },
            final_code: None,
        };
    };

    let _ = std::fs::create_dir_all(paths.readful_result_dir());
    let result_path = paths.readful_result_dir().join(format!("{function_name}.st"));
    let _ = std::fs::write(&result_path, &first);

    for (i, candidate) in processed.iter().enumerate().skip(1) {
        let suffixed = paths.readful_result_dir().join(format!("{function_name}_cand{}.st", i + 1));
        let _ = std::fs::write(suffixed, candidate);
    }

    if skip_fix {
        return CaseOutcome {
            report: CaseReport { task_id: case.task_id.clone(), function_name, success: false, iterations: 0, error: None },
            final_code: Some(first),
        };
    }

    let _ = std::fs::create_dir_all(paths.readful_result_before_fix_dir());
    let _ = std::fs::copy(&result_path, paths.readful_result_before_fix_dir().join(format!("{function_name}.st")));

    let history_dir = paths.readful_result_history_dir();
    let _ = std::fs::create_dir_all(&history_dir);

    match stc_repair::auto_fix(
        &result_path,
        compiler_project_path,
        &function_name,
        &function_name,
        max_verify_count,
        compiler,
        llm,
        &history_dir,
        infos_dir,
    ) {
        Ok(outcome) => {
            let _ = std::fs::write(&result_path, &outcome.final_code);
            CaseOutcome {
                report: CaseReport {
                    task_id: case.task_id.clone(),
                    function_name,
                    success: outcome.success,
                    iterations: outcome.iterations,
                    error: None,
                },
                final_code: Some(outcome.final_code),
            }
        }
        Err(e) => CaseOutcome {
            report: CaseReport {
                task_id: case.task_id.clone(),
                function_name,
                success: false,
                iterations: 0,
                error: Some(format!("repair failed: {e}")),
            },
            final_code: Some(first),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stc_core::QueryMetadata;

    #[test]
    fn case_from_query_fills_generic_requirement() {
        let query = Query {
            query_id: "p/0".into(),
            text: "FUNCTION_BLOCK FB_Counter\nVAR_INPUT\nbEnable: BOOL;\nEND_VAR".into(),
            metadata: QueryMetadata {
                task_id: "FB_Counter".into(),
                ground_truth: "gt".into(),
                fpath_tuple: ("p".into(), "FB_Counter.st".into()),
                function_name: "FB_Counter".into(),
                lineno: 4,
            },
        };
        let case = case_from_query(&query);
        assert_eq!(case.function_name, "FB_Counter");
        assert!(case.requirement.contains("FB_Counter"));
        assert_eq!(case.function_type, FunctionType::FunctionBlock);
    }

    #[test]
    fn strip_provide_code_removes_matching_prefix() {
        let provide = "FUNCTION_BLOCK FB_Counter\n";
        let candidate = format!("{provide}nCount := nCount + 1;\nEND_FUNCTION_BLOCK\n");
        let stripped = strip_provide_code(&candidate, provide);
        assert_eq!(stripped, "nCount := nCount + 1;\nEND_FUNCTION_BLOCK\n");
    }

    #[test]
    fn strip_provide_code_is_noop_without_prefix_match() {
        let candidate = "nCount := 1;";
        assert_eq!(strip_provide_code(candidate, "FUNCTION_BLOCK FB_Other\n"), candidate);
    }
}
