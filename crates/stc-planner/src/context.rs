//! Cross-file call-site context collection: scans every `.st` file in a
//! project (except the one defining the target) for instance declarations,
//! instance calls, or direct function calls, and extracts a surrounding window.

use regex::Regex;
use stc_core::{ContextType, ContextWindow, FunctionType};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn strip_whitespace(line: &str) -> String {
    line.chars().filter(|c| !c.is_whitespace()).collect()
}

fn defines_function(source: &str, target: &str) -> bool {
    let needle_fb = format!("FUNCTION_BLOCK{target}");
    let needle_fun = format!("FUNCTION{target}");
    let needle_method = format!("METHOD{target}");
    for line in source.lines() {
        let stripped = strip_whitespace(line).to_uppercase();
        let target_upper = target.to_uppercase();
        if stripped.starts_with(&needle_fb.to_uppercase())
            || stripped.starts_with(&needle_fun.to_uppercase())
            || stripped.starts_with(&needle_method.to_uppercase())
        {
            let _ = &target_upper;
            return true;
        }
    }
    false
}

fn extract_window(lines: &[&str], idx: usize, window_size: usize) -> (String, Vec<String>) {
    let start = idx.saturating_sub(window_size);
    let end = (idx + window_size + 1).min(lines.len());
    let surrounding: Vec<String> = lines[start..end].iter().map(|s| s.to_string()).collect();
    (surrounding.join("\n"), surrounding)
}

fn find_instance_declarations(lines: &[&str], target: &str) -> Vec<String> {
    let re = Regex::new(&format!(r"^(\w+):{}$", regex::escape(&format!("{target};")))).unwrap();
    let mut names = Vec::new();
    for line in lines {
        let stripped = strip_whitespace(line);
        if let Some(caps) = re.captures(&stripped) {
            let name = caps[1].to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

fn find_instance_calls(
    lines: &[&str],
    instance: &str,
    window_size: usize,
    file_path: &Path,
) -> Vec<ContextWindow> {
    let re = Regex::new(&format!(r"\b{}\s*\(", regex::escape(instance))).unwrap();
    collect_matches(lines, &re, window_size, file_path)
}

fn find_function_calls(lines: &[&str], target: &str, window_size: usize, file_path: &Path) -> Vec<ContextWindow> {
    let call_re = Regex::new(&format!(r"\b{}\s*\(", regex::escape(target))).unwrap();
    let method_re = Regex::new(&format!(r"\.\s*{}\s*\(", regex::escape(target))).unwrap();

    let mut out = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let stripped = strip_whitespace(line);
        if call_re.is_match(&stripped) && !method_re.is_match(&stripped) {
            let (code_window, surrounding_lines) = extract_window(lines, idx, window_size);
            out.push(ContextWindow {
                file_path: file_path.to_path_buf(),
                line_number: idx + 1,
                context_type: ContextType::Call,
                code_window,
                surrounding_lines,
            });
        }
    }
    out
}

fn collect_matches(lines: &[&str], re: &Regex, window_size: usize, file_path: &Path) -> Vec<ContextWindow> {
    let mut out = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let stripped = strip_whitespace(line);
        if re.is_match(&stripped) {
            let (code_window, surrounding_lines) = extract_window(lines, idx, window_size);
            out.push(ContextWindow {
                file_path: file_path.to_path_buf(),
                line_number: idx + 1,
                context_type: ContextType::Call,
                code_window,
                surrounding_lines,
            });
        }
    }
    out
}

/// Collect call-site context windows for `function_name` across every `.st`
/// file under `project_code_root/{project_name}`, excluding any file that
/// itself defines the target.
pub fn collect_contexts(
    function_name: &str,
    function_type: FunctionType,
    project_code_root: &Path,
    project_name: &str,
    context_window_size: usize,
) -> Vec<ContextWindow> {
    let project_dir: PathBuf = project_code_root.join(project_name);
    let mut contexts = Vec::new();

    for entry in WalkDir::new(&project_dir).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        if !entry.file_name().to_string_lossy().ends_with(".st") {
            continue;
        }

        let Ok(source) = std::fs::read_to_string(entry.path()) else { continue };
        if defines_function(&source, function_name) {
            continue;
        }

        let lines: Vec<&str> = source.lines().collect();

        match function_type {
            FunctionType::FunctionBlock | FunctionType::Method => {
                for instance in find_instance_declarations(&lines, function_name) {
                    contexts.extend(find_instance_calls(&lines, &instance, context_window_size, entry.path()));
                }
            }
            FunctionType::Function => {
                contexts.extend(find_function_calls(&lines, function_name, context_window_size, entry.path()));
            }
        }
    }

    contexts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_instance_declaration_and_call() {
        let dir = tempfile::tempdir().unwrap();
        let project_root = dir.path();
        std::fs::create_dir_all(project_root.join("counter")).unwrap();
        std::fs::write(
            project_root.join("counter/Main.st"),
            "PROGRAM Main\nVAR\n  fbCounter:FB_Counter;\nEND_VAR\nfbCounter(bEnable:=TRUE);\nEND_PROGRAM\n",
        )
        .unwrap();

        let contexts =
            collect_contexts("FB_Counter", FunctionType::FunctionBlock, project_root, "counter", 2);
        assert_eq!(contexts.len(), 1);
        assert!(contexts[0].code_window.contains("fbCounter("));
    }

    #[test]
    fn skips_file_that_defines_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let project_root = dir.path();
        std::fs::create_dir_all(project_root.join("counter")).unwrap();
        std::fs::write(
            project_root.join("counter/FB_Counter.st"),
            "FUNCTION_BLOCK FB_Counter\nVAR_INPUT\nEND_VAR\nEND_FUNCTION_BLOCK\n",
        )
        .unwrap();

        let contexts =
            collect_contexts("FB_Counter", FunctionType::FunctionBlock, project_root, "counter", 2);
        assert!(contexts.is_empty());
    }

    #[test]
    fn function_calls_exclude_method_call_form() {
        let dir = tempfile::tempdir().unwrap();
        let project_root = dir.path();
        std::fs::create_dir_all(project_root.join("p")).unwrap();
        std::fs::write(
            project_root.join("p/Main.st"),
            "PROGRAM Main\nnResult := FUN_Add(1, 2);\nobj.FUN_Add(1, 2);\nEND_PROGRAM\n",
        )
        .unwrap();

        let contexts = collect_contexts("FUN_Add", FunctionType::Function, project_root, "p", 1);
        assert_eq!(contexts.len(), 1);
        assert!(contexts[0].code_window.contains("nResult := FUN_Add"));
    }
}
