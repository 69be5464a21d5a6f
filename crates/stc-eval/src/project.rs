//! Per-project evaluation: matches each `readful_result/*.st` by stem to a
//! ground-truth file and aggregates CodeBLEU scores.

use crate::evaluate::evaluate;
use stc_core::{CodeBleuScore, EvaluationResult};
use std::collections::BTreeMap;
use std::path::Path;

fn average(scores: &[CodeBleuScore]) -> CodeBleuScore {
    let n = scores.len().max(1) as f64;
    let mut sum = CodeBleuScore { codebleu: 0.0, ngram_match: 0.0, weighted_ngram_match: 0.0, syntax_match: 0.0, dataflow_match: 0.0 };
    for s in scores {
        sum.codebleu += s.codebleu;
        sum.ngram_match += s.ngram_match;
        sum.weighted_ngram_match += s.weighted_ngram_match;
        sum.syntax_match += s.syntax_match;
        sum.dataflow_match += s.dataflow_match;
    }
    CodeBleuScore {
        codebleu: sum.codebleu / n,
        ngram_match: sum.ngram_match / n,
        weighted_ngram_match: sum.weighted_ngram_match / n,
        syntax_match: sum.syntax_match / n,
        dataflow_match: sum.dataflow_match / n,
    }
}

/// Evaluate every `*.st` candidate under `readful_result_dir` against a
/// reference file of the same stem under `ground_truth_dir`. Candidates with
/// no matching reference are skipped (not counted in `successful_evaluations`).
pub fn evaluate_project(readful_result_dir: &Path, ground_truth_dir: &Path) -> anyhow::Result<EvaluationResult> {
    let mut per_file = BTreeMap::new();
    let mut reference_lengths = BTreeMap::new();
    let mut prediction_lengths = BTreeMap::new();
    let mut scores = Vec::new();

    let entries = match std::fs::read_dir(readful_result_dir) {
        Ok(e) => e,
        Err(_) => {
            return Ok(EvaluationResult {
                per_file,
                average: average(&[]),
                successful_evaluations: 0,
                reference_lengths,
                prediction_lengths,
            })
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("st") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
        let reference_path = ground_truth_dir.join(format!("{stem}.st"));
        if !reference_path.exists() {
            continue;
        }

        let candidate = std::fs::read_to_string(&path)?;
        let reference = std::fs::read_to_string(&reference_path)?;

        let score = evaluate(&candidate, &reference, "python");
        reference_lengths.insert(stem.to_string(), reference.len());
        prediction_lengths.insert(stem.to_string(), candidate.len());
        per_file.insert(stem.to_string(), score);
        scores.push(score);
    }

    let successful_evaluations = scores.len();
    Ok(EvaluationResult { per_file, average: average(&scores), successful_evaluations, reference_lengths, prediction_lengths })
}
