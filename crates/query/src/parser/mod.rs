//! Parsers for the option mini-languages.
//!
//! Each parser takes the raw text of one request parameter and returns its
//! AST, or an [`Error`](qopt_core::Error) pointing at the offending offset.

mod expand;
mod filter;
mod order;

pub use expand::{parse_expand, ExpandParser, DEFAULT_MAX_EXPAND_DEPTH};
pub use filter::{
    parse_filters, FilterParser, DEFAULT_MAX_FILTER_DEPTH, DEFAULT_MAX_FILTER_TERMS,
};
pub use order::{parse_order_by, parse_select};

use qopt_core::{Error, Result};

/// Parses a `top`/`skip` count.
pub(crate) fn parse_count(option: &str, text: &str) -> Result<u64> {
    let text = text.trim();
    text.parse::<u64>().map_err(|_| {
        Error::invalid_option(
            option,
            format!("expected a non-negative integer, found '{}'", text),
        )
    })
}
