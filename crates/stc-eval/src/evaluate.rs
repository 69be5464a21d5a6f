//! Evaluator (C10): combines the four subscores with equal 0.25 weights.

use crate::dataflow::dataflow_match;
use crate::ngram::{ngram_match, weighted_ngram_match};
use crate::syntax::syntax_match;
use stc_core::CodeBleuScore;

const WEIGHTS: [f64; 4] = [0.25, 0.25, 0.25, 0.25];

/// Score `candidate` against `reference`. `lang` is accepted for interface
/// symmetry with the original CodeBLEU contract but is not otherwise used —
/// this implementation always evaluates through the Python-grammar stand-in.
pub fn evaluate(candidate: &str, reference: &str, _lang: &str) -> CodeBleuScore {
    let ngram = ngram_match(candidate, reference);
    let weighted_ngram = weighted_ngram_match(candidate, reference);
    let syntax = syntax_match(candidate, reference);
    let dataflow = dataflow_match(candidate, reference);

    let codebleu =
        WEIGHTS[0] * ngram + WEIGHTS[1] * weighted_ngram + WEIGHTS[2] * syntax + WEIGHTS[3] * dataflow;

    CodeBleuScore {
        codebleu,
        ngram_match: ngram,
        weighted_ngram_match: weighted_ngram,
        syntax_match: syntax,
        dataflow_match: dataflow,
    }
}
