//! Retriever (C3): dense embedding dot-product search over the corpus built by
//! `stc-corpus`.

use rayon::prelude::*;
use stc_core::{CorpusDocument, Query, RetrievalResult};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("corpus is empty, cannot retrieve")]
    EmptyCorpus,
    #[error("embedding model failed: {0}")]
    Embedding(String),
}

/// Abstraction over the embedding backend so retrieval logic can be tested
/// without downloading a model.
pub trait Embedder: Sync {
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Static/dense bi-encoder embeddings via `model2vec-rs` (no ONNX runtime,
/// downloads weights from the HuggingFace Hub on first use).
pub struct Model2VecEmbedder {
    model: model2vec_rs::model::StaticModel,
}

impl Model2VecEmbedder {
    pub fn load(model_id: &str) -> Result<Self, RetrieveError> {
        let model = model2vec_rs::model::StaticModel::from_pretrained(model_id, None, None, None)
            .map_err(|e| RetrieveError::Embedding(e.to_string()))?;
        Ok(Self { model })
    }
}

impl Embedder for Model2VecEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        self.model.encode_single(text)
    }
}

const DUMMY_QUERY_ID: &str = "dummy";

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Rank every corpus document against every query by embedding dot product.
/// A single-query call transparently injects a dummy query before ranking and
/// drops it from the returned map afterward (bi-encoders can behave poorly
/// with only one real query present).
pub fn retrieve(
    queries: &[Query],
    corpus: &[CorpusDocument],
    embedder: &dyn Embedder,
) -> Result<BTreeMap<String, RetrievalResult>, RetrieveError> {
    if corpus.is_empty() {
        return Err(RetrieveError::EmptyCorpus);
    }

    let inject_dummy = queries.len() == 1;

    let corpus_embeddings: Vec<(String, Vec<f32>)> = corpus
        .par_iter()
        .map(|doc| (doc.doc_id.clone(), embedder.embed(&doc.text)))
        .collect();

    let mut results = BTreeMap::new();

    let query_texts: Vec<(String, String)> =
        queries.iter().map(|q| (q.query_id.clone(), q.text.clone())).chain(
            if inject_dummy { vec![(DUMMY_QUERY_ID.to_string(), DUMMY_QUERY_ID.to_string())] } else { vec![] },
        ).collect();

    for (query_id, text) in query_texts {
        let q_embedding = embedder.embed(&text);
        let mut scored: Vec<(String, f32)> =
            corpus_embeddings.iter().map(|(doc_id, emb)| (doc_id.clone(), dot(&q_embedding, emb))).collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        results.insert(query_id.clone(), RetrievalResult { query_id, docs: scored });
    }

    if inject_dummy {
        results.remove(DUMMY_QUERY_ID);
    }

    Ok(results)
}

/// Select the top-k `(doc_id, text)` pairs for a query's ranking.
pub fn top_k_texts<'a>(
    result: &RetrievalResult,
    corpus: &'a [CorpusDocument],
    k: usize,
) -> Vec<&'a str> {
    result
        .docs
        .iter()
        .take(k)
        .filter_map(|(doc_id, _)| corpus.iter().find(|d| &d.doc_id == doc_id))
        .map(|d| d.text.as_str())
        .collect()
}
