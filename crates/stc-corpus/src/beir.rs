//! BEIR-shaped dataset file emitters: `corpus.jsonl`, `queries.jsonl`, `qrels/test.tsv`.

use stc_core::{CorpusDocument, Query};
use std::io::Write;
use std::path::Path;

pub fn write_corpus_jsonl(path: &Path, docs: &[CorpusDocument]) -> anyhow::Result<()> {
    let mut f = std::fs::File::create(path)?;
    for doc in docs {
        writeln!(f, "{}", serde_json::to_string(doc)?)?;
    }
    Ok(())
}

pub fn write_queries_jsonl(path: &Path, queries: &[Query]) -> anyhow::Result<()> {
    let mut f = std::fs::File::create(path)?;
    for q in queries {
        writeln!(f, "{}", serde_json::to_string(q)?)?;
    }
    Ok(())
}

/// Score = 1 for every corpus doc whose `_id` contains the query's filename stem.
pub fn write_qrels_tsv(path: &Path, queries: &[Query], docs: &[CorpusDocument]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut f = std::fs::File::create(path)?;
    writeln!(f, "query-id\tcorpus-id\tscore")?;
    for q in queries {
        let stem = &q.metadata.function_name;
        for doc in docs {
            if doc.doc_id.contains(stem.as_str()) {
                writeln!(f, "{}\t{}\t1", q.query_id, doc.doc_id)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stc_core::{CorpusMetadata, QueryMetadata};

    fn sample_doc(id: &str) -> CorpusDocument {
        CorpusDocument {
            doc_id: id.to_string(),
            title: "t".into(),
            text: "text".into(),
            metadata: vec![CorpusMetadata {
                repo: "counter".into(),
                fpath_tuple: ("counter".into(), "FB_Counter.st".into()),
                line_no: 0,
                start_line_no: 0,
                end_line_no: 10,
                window_size: 50,
                slice_size: 5,
            }],
        }
    }

    fn sample_query() -> Query {
        Query {
            query_id: "counter/0".into(),
            text: "stub".into(),
            metadata: QueryMetadata {
                task_id: "FB_Counter".into(),
                ground_truth: "gt".into(),
                fpath_tuple: ("counter".into(), "FB_Counter.st".into()),
                function_name: "FB_Counter".into(),
                lineno: 1,
            },
        }
    }

    #[test]
    fn qrels_matches_by_stem_containment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qrels/test.tsv");
        let docs = vec![sample_doc("counter_FB_Counter.st_0-10"), sample_doc("counter_FB_Other.st_0-10")];
        write_qrels_tsv(&path, &[sample_query()], &docs).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "query-id\tcorpus-id\tscore");
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("counter_FB_Counter.st_0-10"));
    }

    #[test]
    fn corpus_and_queries_roundtrip_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let corpus_path = dir.path().join("corpus.jsonl");
        let queries_path = dir.path().join("queries.jsonl");
        write_corpus_jsonl(&corpus_path, &[sample_doc("d1")]).unwrap();
        write_queries_jsonl(&queries_path, &[sample_query()]).unwrap();

        let corpus_text = std::fs::read_to_string(&corpus_path).unwrap();
        assert_eq!(corpus_text.lines().count(), 1);
        let parsed: CorpusDocument = serde_json::from_str(corpus_text.lines().next().unwrap()).unwrap();
        assert_eq!(parsed.doc_id, "d1");
    }
}
