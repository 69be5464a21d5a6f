//! Dataflow match subscore: approximates def-use edges by a lexical pass over
//! `:=` assignments (no real dataflow graph is built — see SPEC_FULL.md §4.10).

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn assignment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\s*:=\s*([^;]+);?").unwrap())
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap())
}

/// One `(definition, use)` edge: the assigned variable paired with a variable
/// read on the right-hand side of the same assignment.
fn def_use_edges(code: &str) -> HashSet<(String, String)> {
    let mut edges = HashSet::new();
    for caps in assignment_re().captures_iter(code) {
        let target = caps[1].to_string();
        let rhs = &caps[2];
        for ident in identifier_re().find_iter(rhs) {
            edges.insert((target.clone(), ident.as_str().to_string()));
        }
    }
    edges
}

/// Jaccard overlap of def-use edges between candidate and reference.
pub fn dataflow_match(candidate: &str, reference: &str) -> f64 {
    let cand_edges = def_use_edges(candidate);
    let ref_edges = def_use_edges(reference);

    if cand_edges.is_empty() && ref_edges.is_empty() {
        return 0.0;
    }

    let intersection = cand_edges.intersection(&ref_edges).count();
    let union = cand_edges.union(&ref_edges).count();

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}
