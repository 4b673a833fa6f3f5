//! Raw option strings as they arrive in a request.

use crate::parser::parse_count;
use qopt_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Query-string parameters carrying the option mini-languages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryParams {
    pub filters: Option<String>,
    pub order_by: Option<String>,
    pub select: Option<String>,
    pub expand: Option<String>,
    pub top: Option<String>,
    pub skip: Option<String>,
    pub skiptoken: Option<String>,
}

impl QueryParams {
    /// Decodes a URL query string such as `filters=a%20eq%201&top=10`.
    /// Unknown parameters are ignored.
    pub fn from_query_str(query: &str) -> Result<Self> {
        serde_urlencoded::from_str(query.trim_start_matches('?'))
            .map_err(|e| Error::invalid_option("query", e.to_string()))
    }

    /// Returns the parsed `top`, if present and not blank.
    pub fn top(&self) -> Result<Option<u64>> {
        non_blank(&self.top).map(|t| parse_count("top", t)).transpose()
    }

    /// Returns the parsed `skip`, if present and not blank.
    pub fn skip(&self) -> Result<Option<u64>> {
        non_blank(&self.skip).map(|s| parse_count("skip", s)).transpose()
    }

    pub fn filters(&self) -> Option<&str> {
        non_blank(&self.filters)
    }

    pub fn order_by(&self) -> Option<&str> {
        non_blank(&self.order_by)
    }

    pub fn select(&self) -> Option<&str> {
        non_blank(&self.select)
    }

    pub fn expand(&self) -> Option<&str> {
        non_blank(&self.expand)
    }

    pub fn skiptoken(&self) -> Option<&str> {
        non_blank(&self.skiptoken)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
