//! Corpus Builder: walks a project tree and emits sliding-window code snippets
//! as retrieval documents (BEIR `corpus.jsonl` entries).

use stc_core::{CorpusDocument, CorpusMetadata};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Window {
    line_no: usize,
    start_line_no: usize,
    end_line_no: usize,
}

/// Two-phase sliding window: a warm-up that grows from `window_size / 2` up to
/// `window_size`, always anchored at line 0, followed by a fixed-size stride.
/// If EOF is reached during warm-up the stride phase never runs.
fn generate_sliding_windows(total_lines: usize, window_size: usize, slice_size: usize) -> Vec<Window> {
    let mut windows = Vec::new();
    if total_lines == 0 {
        return windows;
    }

    let half_window = window_size / 2;
    let mut current_window_size = half_window;
    let start_line = 0usize;
    let mut line_no = 0usize;

    loop {
        if current_window_size > window_size {
            break;
        }
        let end_line = (start_line + current_window_size).min(total_lines);
        windows.push(Window { line_no, start_line_no: start_line, end_line_no: end_line });

        if end_line >= total_lines {
            return windows;
        }

        current_window_size += slice_size;
        line_no += slice_size;
    }

    let mut line_no = slice_size;
    while line_no < total_lines {
        let start_line = line_no;
        let end_line = (line_no + window_size).min(total_lines);
        windows.push(Window { line_no, start_line_no: start_line, end_line_no: end_line });

        line_no += slice_size;
        if end_line >= total_lines {
            break;
        }
    }

    windows
}

fn read_file_lines(path: &Path) -> Option<Vec<String>> {
    let text = std::fs::read_to_string(path).ok()?;
    Some(text.lines().map(|l| format!("{l}\n")).collect())
}

fn collect_files(project_root: &Path, suffix: &str) -> Vec<(PathBuf, PathBuf)> {
    WalkDir::new(project_root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(suffix))
        .filter_map(|e| {
            let full = e.path().to_path_buf();
            let rel = full.strip_prefix(project_root).ok()?.to_path_buf();
            Some((full, rel))
        })
        .collect()
}

/// Build the full corpus for one project. Unreadable files are skipped with a
/// warning on stderr; they never abort the build.
pub fn build_corpus(
    project_root: &Path,
    suffix: &str,
    window_size: usize,
    slice_size: usize,
    project_name: &str,
) -> Vec<CorpusDocument> {
    let mut docs = Vec::new();

    for (full_path, rel_path) in collect_files(project_root, suffix) {
        let Some(lines) = read_file_lines(&full_path) else {
            eprintln!("warning: could not read {}", full_path.display());
            continue;
        };

        let windows = generate_sliding_windows(lines.len(), window_size, slice_size);
        let rel_str = rel_path.to_string_lossy().replace('\\', "/");

        for w in windows {
            let content: String = lines[w.start_line_no..w.end_line_no].concat();
            let raw_id = format!("{project_name}_{rel_str}_{}-{}", w.start_line_no, w.end_line_no);
            let doc_id = stc_core::sanitize::sanitize(&raw_id);

            docs.push(CorpusDocument {
                doc_id,
                title: format!("{project_name}-{rel_str}"),
                text: content,
                metadata: vec![CorpusMetadata {
                    repo: project_name.to_string(),
                    fpath_tuple: (project_name.to_string(), rel_str.clone()),
                    line_no: w.line_no,
                    start_line_no: w.start_line_no,
                    end_line_no: w.end_line_no,
                    window_size,
                    slice_size,
                }],
            });
        }
    }

    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_emits_no_windows() {
        assert!(generate_sliding_windows(0, 50, 5).is_empty());
    }

    #[test]
    fn short_file_emits_single_window() {
        let windows = generate_sliding_windows(10, 50, 5);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start_line_no, 0);
        assert_eq!(windows[0].end_line_no, 10);
    }

    #[test]
    fn exact_window_size_stops_at_warmup_eof() {
        // window_size=20, slice_size=10: warmup docs [0,10] then [0,20]. The
        // second warmup window already reaches total_lines, so the function
        // returns immediately and the stride phase never runs.
        let windows = generate_sliding_windows(20, 20, 10);
        assert_eq!(windows.len(), 2);
        assert_eq!((windows[0].start_line_no, windows[0].end_line_no), (0, 10));
        assert_eq!((windows[1].start_line_no, windows[1].end_line_no), (0, 20));
    }

    #[test]
    fn warmup_reaching_eof_skips_stride_phase() {
        // 14 lines, window_size=20, slice_size=10: warmup [0,10] then [0,14] (EOF).
        let windows = generate_sliding_windows(14, 20, 10);
        assert_eq!(windows.len(), 2);
        assert_eq!((windows[0].start_line_no, windows[0].end_line_no), (0, 10));
        assert_eq!((windows[1].start_line_no, windows[1].end_line_no), (0, 14));
    }

    #[test]
    fn stride_phase_advances_by_slice_size() {
        let windows = generate_sliding_windows(100, 20, 10);
        // warmup: size 10 -> [0,10]; size 20 -> [0,20]
        // stride: line_no=10 -> [10,30]; 20 -> [20,40]; ... until end.
        let stride: Vec<_> = windows.iter().skip(2).collect();
        assert_eq!(stride[0].start_line_no, 10);
        assert_eq!(stride[1].start_line_no, 20);
        for w in &stride {
            assert!(w.end_line_no - w.start_line_no <= 20);
        }
    }

    #[test]
    fn builds_corpus_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("FB_Counter.st"),
            "FUNCTION_BLOCK FB_Counter\nVAR_INPUT\n  bEnable : BOOL;\nEND_VAR\n",
        )
        .unwrap();

        let docs = build_corpus(dir.path(), ".st", 50, 5, "counter");
        assert!(!docs.is_empty());
        assert!(docs[0].doc_id.starts_with("counter_FB_Counter.st_"));
        assert!(docs[0].text.contains("FUNCTION_BLOCK"));
    }
}
