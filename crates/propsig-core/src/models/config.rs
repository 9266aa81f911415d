//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PropsigError, Result};

/// Main configuration for the propsig pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PropsigConfig {
    /// Semantic extraction service configuration.
    pub semantic: SemanticConfig,

    /// Page fetching configuration.
    pub fetch: FetchConfig,

    /// Batch run configuration.
    pub batch: BatchConfig,

    /// Names of the descriptor columns in the input sheet.
    pub columns: ColumnNames,

    /// Output configuration.
    pub output: OutputConfig,
}

/// Semantic extraction service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    /// Base URL of an OpenAI-compatible API.
    pub api_base: String,

    /// Model name.
    pub model: String,

    /// Maximum tokens in the completion.
    pub max_tokens: u32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Ceiling on the HTML characters sent per request.
    pub max_fragment_chars: usize,

    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 500,
            timeout_secs: 60,
            max_fragment_chars: 24_000,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Page fetching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// User agent sent with page requests.
    pub user_agent: String,

    /// Environment variable holding the authenticated session cookie.
    pub cookie_env: String,

    /// URL fragment that marks a redirect to the login page.
    pub login_marker: String,

    /// URL fragment expected on a document page.
    pub document_marker: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("propsig/", env!("CARGO_PKG_VERSION")).to_string(),
            cookie_env: "PROPSIG_SESSION_COOKIE".to_string(),
            login_marker: "/login/".to_string(),
            document_marker: "proposals/view".to_string(),
        }
    }
}

/// Batch run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum number of descriptors processed per run.
    pub limit: usize,

    /// Pause between documents in milliseconds.
    pub delay_ms: u64,

    /// Attempts at the semantic strategy before falling back.
    pub primary_attempts: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            delay_ms: 2000,
            primary_attempts: 1,
        }
    }
}

/// Header names of the well-known descriptor columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub company: String,
    pub document_url: String,
    pub value: String,
    pub date_created: String,
    pub signed_on: String,
    pub signed_by: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            company: "Company".to_string(),
            // The source sheet keeps document links under this header.
            document_url: "Document type".to_string(),
            value: "Value".to_string(),
            date_created: "Date Created".to_string(),
            signed_on: "Signed On".to_string(),
            signed_by: "Signed by".to_string(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the CSV written after a run.
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("proposal.csv"),
        }
    }
}

impl PropsigConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| PropsigError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| PropsigError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Read the semantic service credential from the environment.
    pub fn api_key(&self) -> Option<String> {
        read_env(&self.semantic.api_key_env)
    }

    /// Read the session cookie from the environment.
    pub fn session_cookie(&self) -> Option<String> {
        read_env(&self.fetch.cookie_env)
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
