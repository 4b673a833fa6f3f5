//! Parser for the `expand` mini-language.
//!
//! ```text
//! expand := item (',' item)*
//! item   := property | property '(' clause (';' clause)* ')'
//! clause := ('expand' | 'filters' | 'orderBy' | 'select' | 'top' | 'skip' | 'skiptoken') '=' text
//! ```
//!
//! Clause values are handed to the respective parser; `expand=` recurses.

use super::filter::FilterParser;
use super::order::{parse_order_by, parse_select};
use super::parse_count;
use crate::ast::ExpandNode;
use crate::lexer::{is_identifier_char, split_top_level};
use qopt_core::{Error, Result};

/// Nesting limit applied by [`parse_expand`].
pub const DEFAULT_MAX_EXPAND_DEPTH: usize = 5;

/// Expand parser with a nesting limit.
///
/// Syntax errors raised by the clause parsers carry offsets into the complete
/// expand text.
#[derive(Clone, Copy, Debug)]
pub struct ExpandParser {
    max_depth: usize,
    filters: FilterParser,
}

impl Default for ExpandParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EXPAND_DEPTH)
    }
}

impl ExpandParser {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            filters: FilterParser::default(),
        }
    }

    /// Uses `filters` for `filters=` clauses.
    pub fn with_filter_parser(mut self, filters: FilterParser) -> Self {
        self.filters = filters;
        self
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Parses expand text into one node per top-level item.
    pub fn parse(&self, input: &str) -> Result<Vec<ExpandNode>> {
        self.parse_level(input, input, 0, 1)
    }

    fn parse_level(
        &self,
        root: &str,
        input: &str,
        offset: usize,
        depth: usize,
    ) -> Result<Vec<ExpandNode>> {
        if depth > self.max_depth {
            return Err(Error::invalid_expand(format!(
                "expand nesting exceeds the maximum depth of {}",
                self.max_depth
            )));
        }
        if input.trim().is_empty() {
            return Err(Error::invalid_expand("empty expand"));
        }
        let items = split_top_level(input, ',').map_err(|_| unbalanced(input))?;
        items
            .into_iter()
            .map(|(at, item)| self.parse_item(root, item, offset + at, depth))
            .collect()
    }

    fn parse_item(
        &self,
        root: &str,
        item: &str,
        offset: usize,
        depth: usize,
    ) -> Result<ExpandNode> {
        let (item, offset) = trimmed(item, offset);
        let (name, body) = match item.find('(') {
            None => (item, None),
            Some(open) => {
                if !item.ends_with(')') {
                    return Err(unbalanced(item));
                }
                let body = &item[open + 1..item.len() - 1];
                (item[..open].trim_end(), Some((body, offset + open + 1)))
            }
        };
        if name.is_empty() || !name.chars().all(is_identifier_char) {
            return Err(Error::invalid_expand(format!(
                "invalid expand property '{}'",
                name
            )));
        }

        let mut node = ExpandNode::new(name);
        if let Some((body, body_offset)) = body {
            self.apply_clauses(root, &mut node, body, body_offset, depth)?;
        }
        Ok(node)
    }

    fn apply_clauses(
        &self,
        root: &str,
        node: &mut ExpandNode,
        body: &str,
        offset: usize,
        depth: usize,
    ) -> Result<()> {
        let clauses = split_top_level(body, ';').map_err(|_| unbalanced(body))?;
        for (at, clause) in clauses {
            let (clause, clause_offset) = trimmed(clause, offset + at);
            if clause.is_empty() {
                continue;
            }
            let (key, value) = clause.split_once('=').ok_or_else(|| {
                Error::invalid_expand(format!("expected option=value, found '{}'", clause))
            })?;
            let (value, value_offset) = trimmed(value, clause_offset + key.len() + 1);
            let relocate = |err| rebase(err, root, value_offset);
            match key.trim().to_ascii_lowercase().as_str() {
                "expand" => {
                    node.children = self.parse_level(root, value, value_offset, depth + 1)?
                }
                "filters" => node.filters = Some(self.filters.parse(value).map_err(relocate)?),
                "orderby" => node.order_by = parse_order_by(value).map_err(relocate)?,
                "select" => node.select = parse_select(value).map_err(relocate)?,
                "top" => node.top = Some(parse_count("top", value)?),
                "skip" => node.skip = parse_count("skip", value)?,
                "skiptoken" => node.skiptoken = Some(value.to_string()),
                _ => {
                    return Err(Error::invalid_expand(format!(
                        "unknown expand option '{}' on '{}'",
                        key.trim(),
                        node.property_name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Parses expand text with the default nesting limit.
pub fn parse_expand(input: &str) -> Result<Vec<ExpandNode>> {
    ExpandParser::default().parse(input)
}

fn unbalanced(input: &str) -> Error {
    Error::invalid_expand(format!("invalid parentheses balance in '{}'", input))
}

/// Trims `text`, shifting its offset past the leading whitespace.
fn trimmed(text: &str, offset: usize) -> (&str, usize) {
    let start = text.len() - text.trim_start().len();
    (text.trim(), offset + start)
}

/// Moves a clause-relative syntax error onto the complete expand text.
fn rebase(err: Error, root: &str, offset: usize) -> Error {
    match err {
        Error::Syntax(e) => Error::syntax(e.message, offset + e.position, root),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FilterNode, OrderByNode, Operator};
    use qopt_core::Value;

    fn expand_message(err: Error) -> String {
        match err {
            Error::InvalidExpand { message } => message,
            other => panic!("expected invalid expand, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_expand_with_options() {
        let nodes = parse_expand("comments(filters=approved eq true;top=5),author").unwrap();
        assert_eq!(nodes.len(), 2);

        let comments = &nodes[0];
        assert_eq!(comments.property_name, "comments");
        assert_eq!(
            comments.filters,
            Some(FilterNode::expression("approved", Operator::Eq, Value::Boolean(true)).unwrap())
        );
        assert_eq!(comments.top, Some(5));
        assert!(comments.children.is_empty());

        assert_eq!(nodes[1], ExpandNode::new("author"));
    }

    #[test]
    fn test_parse_expand_all_clauses() {
        let nodes = parse_expand(
            "comments(expand=author,likes;filters=score in [1, 2];orderBy=createdAt desc, id;\
             top=10;skip=20;skiptoken=abc;select=id,body)",
        )
        .unwrap();
        let node = &nodes[0];

        assert_eq!(
            node.children,
            vec![ExpandNode::new("author"), ExpandNode::new("likes")]
        );
        assert!(node.filters.is_some());
        assert_eq!(
            node.order_by,
            vec![OrderByNode::desc("createdAt"), OrderByNode::asc("id")]
        );
        assert_eq!(node.top, Some(10));
        assert_eq!(node.skip, 20);
        assert_eq!(node.skiptoken.as_deref(), Some("abc"));
        assert_eq!(node.select, vec!["id", "body"]);
    }

    #[test]
    fn test_parse_expand_nested() {
        let nodes = parse_expand("author(expand=posts(expand=tags;top=3))").unwrap();
        let posts = &nodes[0].children[0];
        assert_eq!(posts.property_name, "posts");
        assert_eq!(posts.top, Some(3));
        assert_eq!(posts.children, vec![ExpandNode::new("tags")]);
    }

    #[test]
    fn test_parse_expand_keys_case_insensitive() {
        let nodes = parse_expand("comments(ORDERBY=id desc;Top=1)").unwrap();
        assert_eq!(nodes[0].order_by, vec![OrderByNode::desc("id")]);
        assert_eq!(nodes[0].top, Some(1));
    }

    #[test]
    fn test_parse_expand_unbalanced() {
        for input in ["comments(top=5", "comments top=5)", "a(b)(c)", "a(b)c"] {
            let message = expand_message(parse_expand(input).unwrap_err());
            assert!(message.contains("invalid parentheses balance"), "{}", input);
        }
    }

    #[test]
    fn test_parse_expand_invalid() {
        assert!(expand_message(parse_expand("").unwrap_err()).contains("empty"));
        assert!(expand_message(parse_expand("comments(limit=5)").unwrap_err()).contains("limit"));
        assert!(parse_expand("comments(top)").is_err());
        assert!(parse_expand("a,,b").is_err());
        assert!(parse_expand("com ments").is_err());
    }

    #[test]
    fn test_parse_expand_bad_counts() {
        let err = parse_expand("comments(top=many)").unwrap_err();
        assert!(matches!(err, Error::InvalidOption { ref option, .. } if option == "top"));
        assert!(matches!(
            parse_expand("comments(skip=-1)").unwrap_err(),
            Error::InvalidOption { .. }
        ));
    }

    #[test]
    fn test_parse_expand_nested_filter_errors_propagate() {
        let err = parse_expand("comments(filters=score gt)").unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
    }

    #[test]
    fn test_parse_expand_errors_point_into_full_text() {
        let input = "author, comments(top=5; filters= score gt ;orderBy=id)";
        match parse_expand(input).unwrap_err() {
            Error::Syntax(e) => {
                assert_eq!(e.input, input);
                assert_eq!(e.position, 41);
            }
            other => panic!("expected syntax error, got {:?}", other),
        }

        let input = "a(expand=b(orderBy=id sideways))";
        match parse_expand(input).unwrap_err() {
            Error::Syntax(e) => {
                assert_eq!(e.input, input);
                assert_eq!(&input[e.position..e.position + 8], "sideways");
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_expand_uses_filter_limits() {
        let parser = ExpandParser::default().with_filter_parser(FilterParser::new(0, 8));
        assert!(parser.parse("comments(filters=a eq 1)").is_ok());
        let err = parser.parse("comments(filters=(a eq 1))").unwrap_err();
        match err {
            Error::Syntax(e) => assert_eq!(e.position, 17),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_expand_depth_limit() {
        let parser = ExpandParser::new(2);
        assert!(parser.parse("a(expand=b)").is_ok());
        let err = parser.parse("a(expand=b(expand=c))").unwrap_err();
        assert!(expand_message(err).contains("maximum depth"));
    }
}
