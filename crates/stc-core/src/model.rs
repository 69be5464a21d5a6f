use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of IEC 61131-3 program organization unit a [`Case`] targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FunctionType {
    Function,
    FunctionBlock,
    Method,
}

impl FunctionType {
    /// Infer the function type from the leading keyword of a declaration stub,
    /// defaulting to `FunctionBlock` when no header keyword is recognized.
    pub fn from_provide_code(provide_code: &str) -> Self {
        let upper = provide_code.trim_start().to_uppercase();
        if upper.starts_with("FUNCTION_BLOCK") {
            FunctionType::FunctionBlock
        } else if upper.starts_with("FUNCTION") {
            FunctionType::Function
        } else if upper.starts_with("METHOD") {
            FunctionType::Method
        } else {
            FunctionType::FunctionBlock
        }
    }

    pub fn end_marker(self) -> &'static str {
        match self {
            FunctionType::Function => "END_FUNCTION",
            FunctionType::FunctionBlock => "END_FUNCTION_BLOCK",
            FunctionType::Method => "END_METHOD",
        }
    }
}

/// A named collection of ST source files under a root directory. Read-only input.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub root: std::path::PathBuf,
}

/// One generation task: a function/FB/method to complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub task_id: String,
    pub function_name: String,
    pub function_type: FunctionType,
    pub requirement: String,
    pub provide_code: String,
    pub ground_truth: String,
}

/// Per-window metadata attached to a [`CorpusDocument`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusMetadata {
    pub repo: String,
    pub fpath_tuple: (String, String),
    pub line_no: usize,
    pub start_line_no: usize,
    pub end_line_no: usize,
    pub window_size: usize,
    pub slice_size: usize,
}

/// One sliding-window snippet emitted by the corpus builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusDocument {
    #[serde(rename = "_id")]
    pub doc_id: String,
    pub title: String,
    pub text: String,
    pub metadata: Vec<CorpusMetadata>,
}

/// Metadata carried alongside a [`Query`] in the BEIR-shaped dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMetadata {
    pub task_id: String,
    pub ground_truth: String,
    pub fpath_tuple: (String, String),
    pub function_name: String,
    pub lineno: usize,
}

/// One retrieval/generation target derived from a [`Case`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    #[serde(rename = "_id")]
    pub query_id: String,
    pub text: String,
    pub metadata: QueryMetadata,
}

/// Ordered `(doc_id, score)` pairs for one query, descending by score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub query_id: String,
    pub docs: Vec<(String, f32)>,
}

/// Whether a [`ContextWindow`] was collected at a call site or a definition site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    Call,
    Definition,
}

/// A slice of source surrounding a call or definition of the target function,
/// collected by the Planner while scanning the rest of the project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextWindow {
    pub file_path: std::path::PathBuf,
    pub line_number: usize,
    pub context_type: ContextType,
    pub code_window: String,
    pub surrounding_lines: Vec<String>,
}

/// Declaration vs. implementation classification of a compile error, per CODESYS's
/// own `IsDef` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "Declaration Section Error")]
    Declaration,
    #[serde(rename = "Implementation Section Error")]
    Implementation,
    #[serde(rename = "System Error")]
    System,
}

/// A single normalized compile error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileError {
    pub error_desc: String,
    pub error_type: ErrorKind,
    pub line_no: i64,
    pub line_content: String,
    pub code_window: String,
}

/// Response from [`crate::model`]-adjacent `stc-compiler`'s `syntax_check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResponse {
    pub success: bool,
    pub result: String,
    pub errors: Vec<CompileError>,
}

/// CodeBLEU-style subscores for one candidate/reference pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CodeBleuScore {
    pub codebleu: f64,
    pub ngram_match: f64,
    pub weighted_ngram_match: f64,
    pub syntax_match: f64,
    pub dataflow_match: f64,
}

/// Aggregated per-project evaluation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub per_file: BTreeMap<String, CodeBleuScore>,
    pub average: CodeBleuScore,
    pub successful_evaluations: usize,
    pub reference_lengths: BTreeMap<String, usize>,
    pub prediction_lengths: BTreeMap<String, usize>,
}

/// Chat role for LLM messages, OpenAI-compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat-completions message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// LLM connection/sampling configuration, injected rather than held in a global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub retry_count: u32,
    pub retry_backoff_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o".to_string(),
            temperature: 0.2,
            top_p: 0.95,
            max_tokens: 1024,
            retry_count: 2,
            retry_backoff_secs: 10,
        }
    }
}
