//! Layered pipeline configuration: built-in defaults, overridden by a TOML
//! config file, overridden by environment variables. CLI flags are layered on
//! top of this by `stc-cli` itself.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::model::LlmConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub window_size: usize,
    pub slice_size: usize,
    pub top_k: usize,
    pub max_verify_count: u32,
    pub context_window_size: usize,
    pub codesys_endpoint: String,
    pub codesys_timeout_secs: u64,
    pub llm: LlmConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_size: 50,
            slice_size: 5,
            top_k: 5,
            max_verify_count: 3,
            context_window_size: 10,
            codesys_endpoint: "http://localhost:18080".to_string(),
            codesys_timeout_secs: 80,
            llm: LlmConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load defaults, then merge a TOML file at `path` if it exists, then apply
    /// environment-variable overrides for LLM/CODESYS credentials.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = Self::default();

        if let Some(path) = path {
            if path.exists() {
                let text = std::fs::read_to_string(path)?;
                cfg = toml::from_str(&text)?;
            }
        }

        cfg.apply_env();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("ZHIZENGZENG_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY")) {
            self.llm.api_key = key;
        }
        if let Ok(base) = std::env::var("ZHIZENGZENG_BASE_URL").or_else(|_| std::env::var("OPENAI_API_BASE")) {
            self.llm.endpoint = base;
        }
        if let Ok(url) = std::env::var("CODESYS_API_URL") {
            self.codesys_endpoint = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_constants() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.window_size, 50);
        assert_eq!(cfg.slice_size, 5);
        assert_eq!(cfg.top_k, 5);
        assert_eq!(cfg.max_verify_count, 3);
        assert_eq!(cfg.context_window_size, 10);
        assert_eq!(cfg.llm.temperature, 0.2);
        assert_eq!(cfg.llm.max_tokens, 1024);
    }

    #[test]
    fn loads_toml_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stc.toml");
        std::fs::write(&path, "window_size = 80\nslice_size = 8\n").unwrap();
        let cfg = PipelineConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.window_size, 80);
        assert_eq!(cfg.slice_size, 8);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = PipelineConfig::load(Some(Path::new("/nonexistent/stc.toml"))).unwrap();
        assert_eq!(cfg.window_size, 50);
    }
}
