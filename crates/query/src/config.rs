//! Engine configuration.

use crate::parser::{
    FilterParser, DEFAULT_MAX_EXPAND_DEPTH, DEFAULT_MAX_FILTER_DEPTH, DEFAULT_MAX_FILTER_TERMS,
};
use qopt_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Limits and defaults applied by the options factory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsConfig {
    /// `top` preset on every default options instance.
    pub default_top: Option<u64>,
    /// Largest `top` a request may set.
    pub max_top: Option<u64>,
    /// Deepest accepted `expand=` nesting.
    #[serde(default = "default_max_expand_depth")]
    pub max_expand_depth: usize,
    /// Deepest accepted parenthesis nesting in filter text.
    #[serde(default = "default_max_filter_depth")]
    pub max_filter_depth: usize,
    /// Most comparisons accepted in one filter text.
    #[serde(default = "default_max_filter_terms")]
    pub max_filter_terms: usize,
}

fn default_max_expand_depth() -> usize {
    DEFAULT_MAX_EXPAND_DEPTH
}

fn default_max_filter_depth() -> usize {
    DEFAULT_MAX_FILTER_DEPTH
}

fn default_max_filter_terms() -> usize {
    DEFAULT_MAX_FILTER_TERMS
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            default_top: None,
            max_top: None,
            max_expand_depth: default_max_expand_depth(),
            max_filter_depth: default_max_filter_depth(),
            max_filter_terms: default_max_filter_terms(),
        }
    }
}

impl OptionsConfig {
    /// Loads the configuration from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::internal(format!("invalid options config: {}", e)))?;
        config.check()?;
        Ok(config)
    }

    /// Filter parser honoring the configured limits.
    pub fn filter_parser(&self) -> FilterParser {
        FilterParser::new(self.max_filter_depth, self.max_filter_terms)
    }

    fn check(&self) -> Result<()> {
        if let (Some(top), Some(max)) = (self.default_top, self.max_top) {
            if top > max {
                return Err(Error::internal(format!(
                    "default_top {} exceeds max_top {}",
                    top, max
                )));
            }
        }
        if self.max_expand_depth == 0 {
            return Err(Error::internal("max_expand_depth must be at least 1"));
        }
        if self.max_filter_terms == 0 {
            return Err(Error::internal("max_filter_terms must be at least 1"));
        }
        Ok(())
    }
}
