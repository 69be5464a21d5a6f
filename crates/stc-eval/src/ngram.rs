//! N-gram and keyword-weighted n-gram match subscores, BLEU-style with a
//! brevity penalty, matching CodeBLEU's `ngram_match` / `weighted_ngram_match`.

use std::collections::HashMap;

const IEC_KEYWORDS: &[&str] = &[
    "IF", "THEN", "ELSE", "ELSIF", "END_IF", "FOR", "TO", "BY", "DO", "END_FOR", "WHILE", "END_WHILE",
    "REPEAT", "UNTIL", "END_REPEAT", "CASE", "OF", "END_CASE", "RETURN", "VAR", "VAR_INPUT", "VAR_OUTPUT",
    "VAR_IN_OUT", "VAR_TEMP", "END_VAR", "FUNCTION", "END_FUNCTION", "FUNCTION_BLOCK", "END_FUNCTION_BLOCK",
];

pub fn tokenize(code: &str) -> Vec<String> {
    code.split(|c: char| c.is_whitespace() || "(){}[];:,.".contains(c))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn ngrams(tokens: &[String], n: usize) -> HashMap<Vec<String>, usize> {
    let mut counts = HashMap::new();
    if tokens.len() < n {
        return counts;
    }
    for window in tokens.windows(n) {
        *counts.entry(window.to_vec()).or_insert(0) += 1;
    }
    counts
}

fn ngram_precision(candidate: &[String], reference: &[String], n: usize, weights: Option<&HashMap<String, f64>>) -> f64 {
    let cand_grams = ngrams(candidate, n);
    let ref_grams = ngrams(reference, n);

    if cand_grams.is_empty() {
        return 0.0;
    }

    let mut matched = 0.0;
    let mut total = 0.0;

    for (gram, count) in &cand_grams {
        let weight = weights
            .map(|w| gram.iter().map(|t| *w.get(t.as_str()).unwrap_or(&1.0)).sum::<f64>() / gram.len() as f64)
            .unwrap_or(1.0);
        total += *count as f64 * weight;
        let clipped = (*count).min(*ref_grams.get(gram).unwrap_or(&0));
        matched += clipped as f64 * weight;
    }

    if total == 0.0 {
        0.0
    } else {
        matched / total
    }
}

fn brevity_penalty(candidate_len: usize, reference_len: usize) -> f64 {
    if candidate_len == 0 {
        return 0.0;
    }
    if candidate_len >= reference_len {
        1.0
    } else {
        (1.0 - reference_len as f64 / candidate_len as f64).exp()
    }
}

fn bleu_like(candidate: &[String], reference: &[String], weights: Option<&HashMap<String, f64>>) -> f64 {
    if candidate.is_empty() || reference.is_empty() {
        return 0.0;
    }

    let precisions: Vec<f64> = (1..=4)
        .map(|n| ngram_precision(candidate, reference, n, weights).max(1e-9))
        .collect();

    let geo_mean = (precisions.iter().map(|p| p.ln()).sum::<f64>() / precisions.len() as f64).exp();
    geo_mean * brevity_penalty(candidate.len(), reference.len())
}

pub fn ngram_match(candidate: &str, reference: &str) -> f64 {
    bleu_like(&tokenize(candidate), &tokenize(reference), None)
}

pub fn weighted_ngram_match(candidate: &str, reference: &str) -> f64 {
    let weights: HashMap<String, f64> =
        IEC_KEYWORDS.iter().map(|k| (k.to_string(), 5.0)).collect();
    bleu_like(&tokenize(candidate), &tokenize(reference), Some(&weights))
}
