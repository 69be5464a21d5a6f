//! Syntax match subscore: parses both sides with the `tree-sitter-python`
//! grammar as a lossy structural stand-in for ST (no ST grammar exists in the
//! crate ecosystem) and compares node-kind multisets.

use std::collections::HashMap;
use tree_sitter::Parser;

fn node_kind_histogram(source: &str) -> HashMap<&'static str, usize> {
    let mut parser = Parser::new();
    if parser.set_language(&tree_sitter_python::LANGUAGE.into()).is_err() {
        return HashMap::new();
    }
    let Some(tree) = parser.parse(source, None) else { return HashMap::new() };

    let mut histogram = HashMap::new();
    let mut cursor = tree.walk();
    let mut stack = vec![tree.root_node()];
    let _ = &mut cursor;

    while let Some(node) = stack.pop() {
        *histogram.entry(node.kind()).or_insert(0) += 1;
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }

    histogram
}

/// Node-kind histogram overlap ratio: `2 * |intersection| / (|cand| + |ref|)`,
/// a Sorensen-Dice-style similarity over multiset counts.
pub fn syntax_match(candidate: &str, reference: &str) -> f64 {
    let cand_hist = node_kind_histogram(candidate);
    let ref_hist = node_kind_histogram(reference);

    if cand_hist.is_empty() && ref_hist.is_empty() {
        return 0.0;
    }

    let mut intersection = 0usize;
    for (kind, count) in &cand_hist {
        intersection += (*count).min(*ref_hist.get(kind).unwrap_or(&0));
    }

    let cand_total: usize = cand_hist.values().sum();
    let ref_total: usize = ref_hist.values().sum();

    if cand_total + ref_total == 0 {
        0.0
    } else {
        2.0 * intersection as f64 / (cand_total + ref_total) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_code_scores_one() {
        let code = "IF bEnable THEN nCount = nCount + 1";
        assert!((syntax_match(code, code) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn structurally_different_code_scores_below_one() {
        let a = "if bEnable:\n    nCount = nCount + 1";
        let b = "for i in range(10):\n    arr[i] = 0";
        assert!(syntax_match(a, b) < 1.0);
    }
}
