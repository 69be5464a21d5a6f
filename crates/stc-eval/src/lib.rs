//! Evaluator (C10): CodeBLEU-style scoring of generated ST against ground truth.

pub mod dataflow;
pub mod evaluate;
pub mod ngram;
pub mod project;
pub mod syntax;

pub use evaluate::evaluate;
pub use project::evaluate_project;
