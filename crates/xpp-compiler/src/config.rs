//! Compiler configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use xpp_eval::{InterpreterConfig, DEFAULT_MAX_CALL_DEPTH};
use xpp_parser::DEFAULT_INDENT_WIDTH;

use crate::error::CompileResult;

/// Settings for one compile-and-run. Every field has a default, so a
/// partial JSON document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Spaces per indent unit. A tab is always one unit.
    pub indent_width: usize,
    pub cache: CacheConfig,
    pub max_call_depth: usize,
    /// Echo `prt` output to stdout.
    pub echo_output: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
            cache: CacheConfig::default(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            echo_output: true,
        }
    }
}

impl CompilerConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(text: &str) -> CompileResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The same configuration with the compile cache turned off.
    pub fn without_cache(mut self) -> Self {
        self.cache.enabled = false;
        self
    }

    /// The engine's share of the settings.
    pub fn interpreter(&self) -> InterpreterConfig {
        InterpreterConfig {
            max_call_depth: self.max_call_depth,
            echo_output: self.echo_output,
        }
    }
}

/// Compile cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Artifact directory. `None` puts artifacts in `.xpp-cache` beside
    /// each source file.
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}
