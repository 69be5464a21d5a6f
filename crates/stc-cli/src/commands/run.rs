use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::RunArgs;
use stc_core::PipelineConfig;
use stc_orchestrator::RunConfig;

pub(crate) fn run_pipeline(args: RunArgs, json_mode: bool) -> Result<i32> {
    let mut pipeline = PipelineConfig::load(args.config.as_deref())
        .context("loading pipeline configuration")?;

    if let Some(top_k) = args.top_k {
        pipeline.top_k = top_k;
    }
    if let Some(max_verify_count) = args.max_verify_count {
        pipeline.max_verify_count = max_verify_count;
    }
    if let Some(endpoint) = args.codesys_endpoint {
        pipeline.codesys_endpoint = endpoint;
    }

    let cfg = RunConfig {
        project_code_root: args.project_root,
        output_root: args.output.unwrap_or_else(|| PathBuf::from("output")),
        ground_truth_root: args.ground_truth.unwrap_or_else(|| PathBuf::from("dataset/generation_context_ground_truth")),
        use_project_code: args.use_project_code,
        result_dir: args.result_dir,
        project_filter: if args.project.is_empty() { None } else { Some(args.project) },
        skip_retrieve: args.skip_retrieve,
        skip_generation: args.skip_generation,
        skip_fix: args.skip_fix,
        skip_plan: args.skip_plan,
        compiler_project_path: args.compiler_project_path,
        infos_dir: args.infos_dir,
        pipeline,
    };

    let report = stc_orchestrator::run(cfg)?;

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for project in &report.projects {
            eprintln!("{}: {:?} ({} cases)", project.name, project.status, project.cases.len());
        }
    }

    Ok(if report.any_failed() { 1 } else { 0 })
}
