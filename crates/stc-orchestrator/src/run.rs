//! Orchestrator (C11) entry point: drives the whole pipeline across a set of
//! projects and produces `run_report.json`.

use crate::pipeline::{case_from_query, run_case, strip_provide_code, ProjectPaths};
use crate::report::{ProjectReport, RunReport, StepReport};
use chrono::Utc;
use stc_compiler::CompilerClient;
use stc_core::{shared_observer, EventKind, Observer, PipelineConfig};
use stc_llm::{HttpLlmClient, LlmClient};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("no LLM API key configured; set OPENAI_API_KEY or ZHIZENGZENG_API_KEY")]
    MissingApiKey,
    #[error("project code root does not exist: {0}")]
    UnreadableProjectRoot(PathBuf),
}

/// Everything the orchestrator needs to know about where things live and
/// which stages to run. Mirrors §6.6's CLI surface one-to-one.
pub struct RunConfig {
    pub project_code_root: PathBuf,
    pub output_root: PathBuf,
    pub ground_truth_root: PathBuf,
    pub use_project_code: bool,
    pub result_dir: Option<String>,
    pub project_filter: Option<Vec<String>>,
    pub skip_retrieve: bool,
    pub skip_generation: bool,
    pub skip_fix: bool,
    pub skip_plan: bool,
    pub compiler_project_path: String,
    pub infos_dir: Option<PathBuf>,
    pub pipeline: PipelineConfig,
}

fn resolve_result_dir(cfg: &RunConfig) -> String {
    cfg.result_dir.clone().unwrap_or_else(|| Utc::now().format("%Y%m%dT%H%M%SZ").to_string())
}

fn discover_projects(root: &Path) -> anyhow::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Run the full pipeline. Only startup misconfiguration (missing LLM
/// credentials, an unreadable project root) is fatal; everything else is
/// caught and folded into the returned [`RunReport`].
pub fn run(cfg: RunConfig) -> anyhow::Result<RunReport> {
    if cfg.pipeline.llm.api_key.is_empty() {
        return Err(OrchestratorError::MissingApiKey.into());
    }
    if !cfg.project_code_root.is_dir() {
        return Err(OrchestratorError::UnreadableProjectRoot(cfg.project_code_root.clone()).into());
    }

    let result_dir = resolve_result_dir(&cfg);
    let started_at = Utc::now();

    let log_path = cfg.output_root.join(&result_dir).join("pipeline.log.jsonl");
    let observer: std::sync::Arc<Observer> = shared_observer(&log_path);

    let llm = HttpLlmClient::new(cfg.pipeline.llm.clone());
    let compiler =
        CompilerClient::new(cfg.pipeline.codesys_endpoint.clone(), cfg.pipeline.llm.api_key.clone(), cfg.pipeline.codesys_timeout_secs);

    let all_projects = discover_projects(&cfg.project_code_root)?;
    let mut projects = Vec::new();

    for name in &all_projects {
        let selected = cfg.project_filter.as_ref().map(|f| f.iter().any(|p| p == name)).unwrap_or(true);
        if selected {
            projects.push(name.clone());
        }
    }

    let mut project_reports = Vec::new();

    for name in &all_projects {
        if !projects.contains(name) {
            let mut report = ProjectReport::new(name);
            report.status = crate::report::Status::Skipped;
            report.push_step(StepReport::skipped("filter", "not selected"));
            project_reports.push(report);
            continue;
        }

        observer.info(EventKind::ProjectStarted, Some(name), None, "");
        let report = run_project(&cfg, &result_dir, name, &llm, &compiler, &observer);
        observer.info(EventKind::ProjectFinished, Some(name), None, format!("{:?}", report.status));
        project_reports.push(report);
    }

    let finished_at = Utc::now();
    let report = RunReport { started_at, finished_at, projects: project_reports };
    report.write(&cfg.output_root.join(&result_dir).join("run_report.json"))?;
    Ok(report)
}

fn run_project(
    cfg: &RunConfig,
    result_dir: &str,
    project_name: &str,
    llm: &dyn LlmClient,
    compiler: &CompilerClient,
    observer: &Observer,
) -> ProjectReport {
    let mut report = ProjectReport::new(project_name);
    let paths = ProjectPaths::new(&cfg.output_root, result_dir, project_name);
    let project_dir = cfg.project_code_root.join(project_name);
    let _ = std::fs::create_dir_all(&paths.root);

    let queries = if cfg.skip_retrieve {
        match load_existing_queries(&paths, cfg.pipeline.top_k) {
            Ok(q) => {
                report.push_step(StepReport::skipped("retrieve", "reused existing result_dir"));
                q
            }
            Err(e) => {
                report.push_step(StepReport::failed("retrieve", e));
                return report;
            }
        }
    } else {
        match build_and_retrieve(&cfg.pipeline, &project_dir, project_name, &paths) {
            Ok(q) => {
                report.push_step(StepReport::ok("retrieve"));
                q
            }
            Err(e) => {
                report.push_step(StepReport::failed("retrieve", e));
                return report;
            }
        }
    };

    if queries.is_empty() {
        report.push_step(StepReport::failed("retrieve", "no queries derived for project"));
        return report;
    }

    for (query, retrieved_owned) in &queries {
        let case = case_from_query(query);
        let retrieved_texts: Vec<&str> = retrieved_owned.iter().map(String::as_str).collect();

        let outcome = run_case(
            &case,
            project_name,
            &cfg.project_code_root,
            &retrieved_texts,
            &paths,
            llm,
            compiler,
            &cfg.compiler_project_path,
            cfg.pipeline.context_window_size,
            cfg.pipeline.max_verify_count,
            1,
            4096,
            cfg.skip_plan,
            cfg.skip_generation,
            cfg.skip_fix,
            cfg.infos_dir.as_deref(),
            observer,
        );

        if let Some(code) = &outcome.final_code {
            let _ = std::fs::create_dir_all(paths.readful_result_no_provide_dir());
            let stripped = strip_provide_code(code, &case.provide_code);
            let _ = std::fs::write(paths.readful_result_no_provide_dir().join(format!("{}.st", case.function_name)), stripped);
        }

        report.cases.push(outcome.report);
    }

    let failed_cases = report.cases.iter().filter(|c| c.error.is_some()).count();
    if failed_cases > 0 && failed_cases == report.cases.len() {
        report.status = crate::report::Status::Failed;
    }

    let ground_truth_dir = if cfg.use_project_code {
        cfg.ground_truth_root.join(project_name).join("FUN")
    } else {
        cfg.ground_truth_root.join(project_name)
    };

    match stc_eval::evaluate_project(&paths.readful_result_dir(), &ground_truth_dir) {
        Ok(eval) => {
            if let Ok(text) = serde_json::to_string_pretty(&eval) {
                let _ = std::fs::write(paths.codebleu_evaluation_json(), text);
            }
            report.push_step(StepReport::ok("evaluate"));
        }
        Err(e) => report.push_step(StepReport::failed("evaluate", e)),
    }

    report
}

type QueryWithContext = (stc_core::Query, Vec<String>);

fn build_and_retrieve(
    pipeline: &PipelineConfig,
    project_dir: &Path,
    project_name: &str,
    paths: &ProjectPaths,
) -> anyhow::Result<Vec<QueryWithContext>> {
    let corpus = stc_corpus::build_corpus(project_dir, ".st", pipeline.window_size, pipeline.slice_size, project_name);

    let mut queries = Vec::new();
    for (idx, doc) in corpus.iter().enumerate() {
        if let Some(meta) = doc.metadata.first() {
            if let Some(query) = stc_corpus::build_query(project_name, meta.fpath_tuple.clone(), &doc.text, Some(idx)) {
                queries.push(query);
            }
        }
    }

    let embedder = stc_retrieve::Model2VecEmbedder::load("minishlab/potion-base-8M")
        .map_err(|e| anyhow::anyhow!("embedding model load failed: {e}"))?;
    let results = stc_retrieve::retrieve(&queries, &corpus, &embedder)?;

    stc_corpus::beir::write_corpus_jsonl(&paths.root.join("corpus.jsonl"), &corpus)?;
    stc_corpus::beir::write_queries_jsonl(&paths.root.join("queries.jsonl"), &queries)?;
    stc_corpus::beir::write_qrels_tsv(&paths.root.join("qrels/test.tsv"), &queries, &corpus)?;

    let mut f = std::fs::File::create(paths.results_jsonl())?;
    use std::io::Write;
    let mut out = Vec::with_capacity(queries.len());
    for query in queries {
        let retrieved_texts = match results.get(&query.query_id) {
            Some(result) => {
                writeln!(f, "{}", serde_json::to_string(result)?)?;
                stc_retrieve::top_k_texts(result, &corpus, pipeline.top_k).into_iter().map(str::to_string).collect()
            }
            None => Vec::new(),
        };
        out.push((query, retrieved_texts));
    }

    Ok(out)
}

fn load_existing_queries(paths: &ProjectPaths, top_k: usize) -> anyhow::Result<Vec<QueryWithContext>> {
    let queries_path = paths.root.join("queries.jsonl");
    let corpus_path = paths.root.join("corpus.jsonl");
    if !queries_path.exists() {
        anyhow::bail!("no queries.jsonl found under existing result_dir");
    }

    let mut queries = Vec::new();
    for line in std::fs::read_to_string(&queries_path)?.lines() {
        if !line.trim().is_empty() {
            queries.push(serde_json::from_str::<stc_core::Query>(line)?);
        }
    }

    let corpus: Vec<stc_core::CorpusDocument> = if corpus_path.exists() {
        std::fs::read_to_string(&corpus_path)?
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<Result<Vec<_>, _>>()?
    } else {
        Vec::new()
    };

    let results: std::collections::BTreeMap<String, stc_core::RetrievalResult> = {
        let results_path = paths.results_jsonl();
        if results_path.exists() {
            std::fs::read_to_string(&results_path)?
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| {
                    let r: stc_core::RetrievalResult = serde_json::from_str(l)?;
                    Ok::<_, anyhow::Error>((r.query_id.clone(), r))
                })
                .collect::<Result<_, _>>()?
        } else {
            Default::default()
        }
    };

    let mut out = Vec::with_capacity(queries.len());
    for query in queries {
        let retrieved_texts = results
            .get(&query.query_id)
            .map(|r| stc_retrieve::top_k_texts(r, &corpus, top_k).into_iter().map(str::to_string).collect())
            .unwrap_or_default();
        out.push((query, retrieved_texts));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_fatal_at_startup() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RunConfig {
            project_code_root: dir.path().to_path_buf(),
            output_root: dir.path().join("output"),
            ground_truth_root: dir.path().join("truth"),
            use_project_code: false,
            result_dir: Some("r1".into()),
            project_filter: None,
            skip_retrieve: true,
            skip_generation: true,
            skip_fix: true,
            skip_plan: true,
            compiler_project_path: "/tmp/p.project".into(),
            infos_dir: None,
            pipeline: PipelineConfig::default(),
        };
        let err = run(cfg).unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn unreadable_project_root_is_fatal_at_startup() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = PipelineConfig::default();
        pipeline.llm.api_key = "test-key".into();
        let cfg = RunConfig {
            project_code_root: dir.path().join("does-not-exist"),
            output_root: dir.path().join("output"),
            ground_truth_root: dir.path().join("truth"),
            use_project_code: false,
            result_dir: Some("r1".into()),
            project_filter: None,
            skip_retrieve: true,
            skip_generation: true,
            skip_fix: true,
            skip_plan: true,
            compiler_project_path: "/tmp/p.project".into(),
            infos_dir: None,
            pipeline,
        };
        let err = run(cfg).unwrap_err();
        assert!(err.to_string().contains("project code root"));
    }

    #[test]
    fn filtered_out_project_is_reported_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("projects/counter")).unwrap();
        std::fs::create_dir_all(dir.path().join("projects/conveyor")).unwrap();
        let mut pipeline = PipelineConfig::default();
        pipeline.llm.api_key = "test-key".into();
        let cfg = RunConfig {
            project_code_root: dir.path().join("projects"),
            output_root: dir.path().join("output"),
            ground_truth_root: dir.path().join("truth"),
            use_project_code: false,
            result_dir: Some("r1".into()),
            project_filter: Some(vec!["counter".into()]),
            skip_retrieve: true,
            skip_generation: true,
            skip_fix: true,
            skip_plan: true,
            compiler_project_path: "/tmp/p.project".into(),
            infos_dir: None,
            pipeline,
        };
        let report = run(cfg).unwrap();
        let conveyor = report.projects.iter().find(|p| p.name == "conveyor").unwrap();
        assert_eq!(conveyor.status, crate::report::Status::Skipped);
    }
}
