//! Generator (C5): assembles the prompt, calls the LLM, and returns candidate
//! raw completions for one case.

use crate::prompt::{build_base_prompt, build_messages};
use stc_core::Case;
use stc_llm::{LlmClient, LlmError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// A naive whitespace/subword-boundary token count, standing in for a BPE
/// tokenizer (none of the teacher's dependencies ship one); used only to
/// enforce `max_length_input` truncation, not for exact LLM billing.
fn approx_token_count(text: &str) -> usize {
    text.split(|c: char| c.is_whitespace() || "(){}[];:,.".contains(c))
        .filter(|s| !s.is_empty())
        .count()
}

fn truncate_to_tokens(text: &str, max_tokens: usize) -> String {
    let mut count = 0usize;
    let mut out = String::new();
    for token in text.split_inclusive(char::is_whitespace) {
        let is_boundary = !token.trim().is_empty();
        if is_boundary {
            count += 1;
        }
        if count > max_tokens {
            break;
        }
        out.push_str(token);
    }
    out
}

/// Produce `n_samples` candidate completions for `case`. Each candidate is the
/// *raw* LLM reply (still markdown-fenced); post-processing happens separately.
pub fn generate_candidates(
    llm: &dyn LlmClient,
    case: &Case,
    retrieved_texts: &[&str],
    plan_text: Option<&str>,
    max_length_input: usize,
    n_samples: usize,
) -> Result<Vec<String>, GenerateError> {
    let base_prompt = build_base_prompt(&case.provide_code, retrieved_texts);
    let base_prompt = if approx_token_count(&base_prompt) > max_length_input {
        truncate_to_tokens(&base_prompt, max_length_input)
    } else {
        base_prompt
    };

    let messages = build_messages(case, plan_text, &base_prompt);

    let mut candidates = Vec::with_capacity(n_samples);
    for _ in 0..n_samples.max(1) {
        candidates.push(llm.complete_chat(&messages)?);
    }
    Ok(candidates)
}
