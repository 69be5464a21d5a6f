//! Library Recommender (C8): parses compiler errors for library/function
//! symbol names and looks up documentation snippets from a library index
//! directory.

use regex::Regex;
use stc_core::CompileError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn symbol_patterns() -> &'static [Regex; 5] {
    static PATTERNS: OnceLock<[Regex; 5]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r#"[Ff]unction\s+["']?([A-Za-z_][A-Za-z0-9_]*)["']?.*requires exactly"#).unwrap(),
            Regex::new(r#"is no input of\s+[Ff]unction\s+["']?([A-Za-z_][A-Za-z0-9_]*)["']?"#).unwrap(),
            Regex::new(r"[Ff]unction\s+'([A-Za-z_][A-Za-z0-9_]*)'").unwrap(),
            Regex::new(r#"[Ff]unction\s+"([A-Za-z_][A-Za-z0-9_]*)""#).unwrap(),
            Regex::new(r"object\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap(),
        ]
    })
}

fn call_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap())
}

/// Extract symbol names referenced by `errors`, deduplicated preserving
/// first-occurrence order. Applies the five error-string patterns in order,
/// then scans each error's `line_content` for bare `name(` call forms.
pub fn extract_library_names(errors: &[CompileError]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut ordered = Vec::new();

    for err in errors {
        for pattern in symbol_patterns() {
            for caps in pattern.captures_iter(&err.error_desc) {
                let name = caps[1].to_string();
                if seen.insert(name.clone()) {
                    ordered.push(name);
                }
            }
        }
    }

    for err in errors {
        if err.line_content.trim().is_empty() {
            continue;
        }
        for caps in call_pattern().captures_iter(&err.line_content) {
            let name = caps[1].to_string();
            if seen.insert(name.clone()) {
                ordered.push(name);
            }
        }
    }

    ordered
}

fn build_path_index(infos_dir: &Path) -> HashMap<String, PathBuf> {
    let mut index = HashMap::new();
    let Ok(entries) = std::fs::read_dir(infos_dir) else { return index };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
        let base = stem.split(" (").next().unwrap_or(stem);
        for key in [stem.to_string(), base.to_string()] {
            index.entry(key).or_insert_with(|| path.clone());
        }
    }

    index
}

/// Resolve each extracted symbol name to its documentation file's full text,
/// skipping names with no match. Order follows [`extract_library_names`].
pub fn recommend(errors: &[CompileError], infos_dir: &Path) -> Vec<(String, String)> {
    let index = build_path_index(infos_dir);
    let mut results = Vec::new();

    for name in extract_library_names(errors) {
        if let Some(path) = index.get(&name) {
            if let Ok(text) = std::fs::read_to_string(path) {
                results.push((name, text));
            }
        }
    }

    results
}

/// Render recommended snippets as an optional repair-prompt section; returns
/// `None` when there is nothing to recommend (decision: inject only when
/// non-empty, see SPEC_FULL.md §4.8/§12.3).
pub fn render_section(recommendations: &[(String, String)]) -> Option<String> {
    if recommendations.is_empty() {
        return None;
    }

    let body = recommendations
        .iter()
        .map(|(name, text)| format!("### {name}\n{}", text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n");

    Some(format!("### Library Reference\n{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stc_core::ErrorKind;

    fn err(desc: &str, line_content: &str) -> CompileError {
        CompileError {
            error_desc: desc.to_string(),
            error_type: ErrorKind::Implementation,
            line_no: 0,
            line_content: line_content.to_string(),
            code_window: String::new(),
        }
    }

    #[test]
    fn extracts_requires_exactly_pattern() {
        let errors = vec![err("Function 'SysFileOpen' requires exactly '3' inputs", "")];
        assert_eq!(extract_library_names(&errors), vec!["SysFileOpen"]);
    }

    #[test]
    fn extracts_is_no_input_of_pattern() {
        let errors = vec![err("szFileName is no input of Function 'SysFileOpen'", "")];
        assert_eq!(extract_library_names(&errors), vec!["SysFileOpen"]);
    }

    #[test]
    fn extracts_call_form_from_line_content_and_dedupes() {
        let errors = vec![
            err("Function 'SysFileOpen' requires exactly '3' inputs", "hFile := SysFileOpen(path, mode, 0);"),
        ];
        assert_eq!(extract_library_names(&errors), vec!["SysFileOpen"]);
    }

    #[test]
    fn recommend_reads_matching_doc_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("SysFileOpen (Function).json"), "{\"doc\": true}").unwrap();

        let errors = vec![err("Function 'SysFileOpen' requires exactly '3' inputs", "")];
        let recs = recommend(&errors, dir.path());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].0, "SysFileOpen");
        assert!(recs[0].1.contains("doc"));
    }

    #[test]
    fn render_section_is_none_when_empty() {
        assert!(render_section(&[]).is_none());
    }

    #[test]
    fn render_section_contains_each_name() {
        let section = render_section(&[("SysFileOpen".to_string(), "desc text".to_string())]).unwrap();
        assert!(section.contains("SysFileOpen"));
        assert!(section.contains("desc text"));
    }
}
