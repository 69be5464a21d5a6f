//! Query Builder: splits a full ST source file into `(provide_code, body)` at
//! the declaration boundary and extracts the target function's name/type.

use regex::Regex;
use stc_core::{FunctionType, Query, QueryMetadata};
use std::sync::OnceLock;

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(FUNCTION_BLOCK|FUNCTION|METHOD)\s+(?:PUBLIC\s+)?([A-Za-z_][A-Za-z0-9_]*)").unwrap()
    })
}

const SKIP_VAR_KINDS: &[&str] =
    &["VAR_INPUT", "VAR_OUTPUT", "VAR_IN_OUT", "VAR_TEMP", "VAR_EXTERNAL", "VAR_GLOBAL"];

/// Result of splitting a source file at the declaration boundary.
pub struct DeclarationSplit {
    pub provide_code: String,
    pub body: String,
}

/// Apply the declaration-boundary rule (spec §4.2):
/// 1. a bare `VAR` line (not one of the `VAR_*` interface kinds) starts the body;
/// 2. else the line after the *last* `END_VAR` starts the body;
/// 3. else the whole file is `provide_code` and the body is empty (decision in
///    SPEC_FULL.md §12.2: prefer "whole file" over "empty" for provide_code).
pub fn split_declaration_boundary(source: &str) -> DeclarationSplit {
    let lines: Vec<&str> = source.lines().collect();

    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed == "VAR" {
            return split_at(&lines, idx);
        }
        // lines like "VAR_INPUT" must not match the bare-VAR case; SKIP_VAR_KINDS
        // covers them explicitly even though `trimmed == "VAR"` already excludes them.
        let _ = SKIP_VAR_KINDS;
    }

    if let Some(last_end_var) = lines.iter().rposition(|l| l.trim() == "END_VAR") {
        return split_at(&lines, last_end_var + 1);
    }

    DeclarationSplit { provide_code: source.to_string(), body: String::new() }
}

fn split_at(lines: &[&str], body_start: usize) -> DeclarationSplit {
    let provide_code = lines[..body_start.min(lines.len())].join("\n");
    let body = if body_start < lines.len() { lines[body_start..].join("\n") } else { String::new() };
    DeclarationSplit { provide_code, body }
}

/// Extract `(function_name, function_type)` from the first POU header line.
pub fn extract_function_info(source: &str) -> Option<(String, FunctionType)> {
    for line in source.lines() {
        if let Some(caps) = header_re().captures(line) {
            let kind = caps.get(1)?.as_str().to_uppercase();
            let name = caps.get(2)?.as_str().to_string();
            let function_type = match kind.as_str() {
                "FUNCTION_BLOCK" => FunctionType::FunctionBlock,
                "FUNCTION" => FunctionType::Function,
                "METHOD" => FunctionType::Method,
                _ => continue,
            };
            return Some((name, function_type));
        }
    }
    None
}

/// Build a [`Query`] from a full ST source file.
pub fn build_query(project_name: &str, fpath_tuple: (String, String), source: &str, index: Option<usize>) -> Option<Query> {
    let (function_name, _function_type) = extract_function_info(source)?;
    let split = split_declaration_boundary(source);

    let query_id = match index {
        Some(i) => format!("{project_name}/{i}"),
        None => format!("{project_name}_{function_name}_query"),
    };

    let lineno = split.provide_code.lines().count();

    Some(Query {
        query_id,
        text: split.provide_code,
        metadata: QueryMetadata {
            task_id: function_name.clone(),
            ground_truth: source.to_string(),
            fpath_tuple,
            function_name,
            lineno,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FB_SOURCE: &str = "FUNCTION_BLOCK FB_Counter\nVAR_INPUT\n    bEnable : BOOL;\nEND_VAR\nVAR_OUTPUT\n    nCount : INT;\nEND_VAR\nVAR\n    nLocal : INT;\nEND_VAR\nIF bEnable THEN\n    nCount := nCount + 1;\nEND_IF\nEND_FUNCTION_BLOCK\n";

    #[test]
    fn bare_var_starts_body() {
        let split = split_declaration_boundary(FB_SOURCE);
        assert!(split.provide_code.contains("VAR_OUTPUT"));
        assert!(!split.provide_code.contains("nLocal"));
        assert!(split.body.trim_start().starts_with("VAR"));
    }

    #[test]
    fn falls_back_to_last_end_var_without_bare_var() {
        let source = "FUNCTION FUN_Add : INT\nVAR_INPUT\n    a : INT;\n    b : INT;\nEND_VAR\nFUN_Add := a + b;\nEND_FUNCTION\n";
        let split = split_declaration_boundary(source);
        assert!(split.provide_code.contains("VAR_INPUT"));
        assert_eq!(split.body.trim(), "FUN_Add := a + b;\nEND_FUNCTION");
    }

    #[test]
    fn no_var_block_keeps_whole_file_as_provide_code() {
        let source = "FUNCTION FUN_Noop\nFUN_Noop := 0;\nEND_FUNCTION\n";
        let split = split_declaration_boundary(source);
        assert_eq!(split.provide_code, source.trim_end_matches('\n'));
        assert!(split.body.is_empty());
    }

    #[test]
    fn extracts_function_block_name() {
        let (name, kind) = extract_function_info(FB_SOURCE).unwrap();
        assert_eq!(name, "FB_Counter");
        assert_eq!(kind, FunctionType::FunctionBlock);
    }

    #[test]
    fn extracts_function_with_public_modifier() {
        let source = "FUNCTION_BLOCK PUBLIC FB_Thing\nVAR_INPUT\nEND_VAR\n";
        let (name, kind) = extract_function_info(source).unwrap();
        assert_eq!(name, "FB_Thing");
        assert_eq!(kind, FunctionType::FunctionBlock);
    }

    #[test]
    fn builds_query_with_indexed_id() {
        let q = build_query("counter", ("counter".into(), "FB_Counter.st".into()), FB_SOURCE, Some(3)).unwrap();
        assert_eq!(q.query_id, "counter/3");
        assert_eq!(q.metadata.function_name, "FB_Counter");
    }
}
