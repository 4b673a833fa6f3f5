//! Recursive-descent parser for filter expressions.
//!
//! ```text
//! expression := term (('and' | 'or') term)*
//! term       := '(' expression ')' | comparison
//! comparison := identifier operator literal
//! literal    := integer | float | 'string' | [array] | null | true | false
//! ```
//!
//! `and` and `or` share one precedence level and fold left:
//! `a and b or c` is `OR(AND(a, b), c)`.

use crate::ast::{FilterNode, FilterValue, LogicalOp, Operation, Operator};
use crate::lexer::Cursor;
use qopt_core::{Result, Value};

/// Parenthesis nesting limit applied by [`parse_filters`].
pub const DEFAULT_MAX_FILTER_DEPTH: usize = 32;

/// Comparison count limit applied by [`parse_filters`].
pub const DEFAULT_MAX_FILTER_TERMS: usize = 512;

/// Filter parser with nesting and size limits.
///
/// Every tree walk over a [`FilterNode`] recurses, and a chain of `n`
/// comparisons folds into a tree `n` levels deep, so both limits bound the
/// stack used by the parser and by everything downstream of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterParser {
    max_depth: usize,
    max_terms: usize,
}

impl Default for FilterParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILTER_DEPTH, DEFAULT_MAX_FILTER_TERMS)
    }
}

impl FilterParser {
    pub fn new(max_depth: usize, max_terms: usize) -> Self {
        Self {
            max_depth,
            max_terms,
        }
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    pub fn max_terms(&self) -> usize {
        self.max_terms
    }

    /// Parses a filter expression.
    pub fn parse(&self, input: &str) -> Result<FilterNode> {
        let mut descent = Descent {
            cursor: Cursor::new(input),
            limits: *self,
            depth: 0,
            terms: 0,
        };
        descent.parse_root()
    }
}

/// Parses a filter expression with the default limits.
pub fn parse_filters(input: &str) -> Result<FilterNode> {
    FilterParser::default().parse(input)
}

struct Descent<'a> {
    cursor: Cursor<'a>,
    limits: FilterParser,
    depth: usize,
    terms: usize,
}

impl Descent<'_> {
    fn parse_root(&mut self) -> Result<FilterNode> {
        self.cursor.skip_whitespace();
        if self.cursor.is_eof() {
            return Err(self.cursor.error("Empty filter expression"));
        }
        let node = self.parse_expression()?;
        self.cursor.skip_whitespace();
        if !self.cursor.is_eof() {
            return Err(self
                .cursor
                .error(format!("Unexpected {}", self.cursor.found())));
        }
        Ok(node)
    }

    fn parse_expression(&mut self) -> Result<FilterNode> {
        let mut left = self.parse_term()?;
        loop {
            self.cursor.skip_whitespace();
            let op = if self.cursor.scan_keyword("and") {
                LogicalOp::And
            } else if self.cursor.scan_keyword("or") {
                LogicalOp::Or
            } else {
                break;
            };
            let right = self.parse_term()?;
            left = FilterNode::Operation(Operation::new(op, vec![left, right]));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<FilterNode> {
        self.cursor.skip_whitespace();
        if self.cursor.peek() == Some('(') {
            if self.depth >= self.limits.max_depth {
                return Err(self.cursor.error(format!(
                    "Filter nesting exceeds the maximum depth of {}",
                    self.limits.max_depth
                )));
            }
            self.cursor.advance();
            self.depth += 1;
            let inner = self.parse_expression()?;
            self.depth -= 1;
            self.cursor.expect(')')?;
            return Ok(inner);
        }
        if self.terms >= self.limits.max_terms {
            return Err(self.cursor.error(format!(
                "Filter exceeds the maximum of {} comparisons",
                self.limits.max_terms
            )));
        }
        self.terms += 1;
        parse_comparison(&mut self.cursor)
    }
}

fn parse_comparison(cursor: &mut Cursor<'_>) -> Result<FilterNode> {
    let property = cursor.scan_identifier().ok_or_else(|| {
        cursor.error(format!("Expected property name, found {}", cursor.found()))
    })?;

    cursor.skip_whitespace();
    let op_start = cursor.pos();
    let keyword = cursor
        .scan_identifier()
        .ok_or_else(|| cursor.error(format!("Expected operator, found {}", cursor.found())))?;
    let operator = match Operator::parse(keyword) {
        Some(op) if cursor.at_word_end() => op,
        _ => {
            return Err(cursor.error_at(format!("Unknown operator '{}'", keyword), op_start));
        }
    };

    cursor.skip_whitespace();
    let value = parse_literal(cursor)?;
    if !cursor.at_value_end() {
        return Err(cursor.error(format!("Unexpected {} after literal", cursor.found())));
    }
    FilterNode::expression(property, operator, value)
}

fn parse_literal(cursor: &mut Cursor<'_>) -> Result<FilterValue> {
    match cursor.peek() {
        Some('\'') => cursor
            .scan_quoted_string()
            .map(|s| FilterValue::Single(Value::String(s))),
        Some('[') => cursor.scan_array().map(FilterValue::List),
        Some(c) if c.is_ascii_digit() => cursor.scan_number().map(FilterValue::Single),
        _ if cursor.scan_keyword("null") => Ok(FilterValue::Single(Value::Null)),
        _ if cursor.scan_keyword("true") => Ok(FilterValue::Single(Value::Boolean(true))),
        _ if cursor.scan_keyword("false") => Ok(FilterValue::Single(Value::Boolean(false))),
        _ => Err(cursor.error(format!("Expected literal, found {}", cursor.found()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expression;
    use qopt_core::{Error, ErrorKind};

    fn leaf(property: &str, op: Operator, value: impl Into<FilterValue>) -> FilterNode {
        FilterNode::expression(property, op, value).unwrap()
    }

    fn syntax_position(err: Error) -> usize {
        match err {
            Error::Syntax(e) => e.position,
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_comparison() {
        let node = parse_filters("status eq 'active'").unwrap();
        assert_eq!(node, leaf("status", Operator::Eq, Value::from("active")));

        let node = parse_filters("author.name ne 'Bob'").unwrap();
        assert_eq!(node, leaf("author.name", Operator::Ne, Value::from("Bob")));
    }

    #[test]
    fn test_parse_and_chain() {
        let node = parse_filters("a eq 1 and b eq 2").unwrap();
        assert_eq!(
            node,
            FilterNode::and(vec![
                leaf("a", Operator::Eq, Value::Int64(1)),
                leaf("b", Operator::Eq, Value::Int64(2)),
            ])
        );
    }

    #[test]
    fn test_parse_folds_left_without_precedence() {
        let node = parse_filters("a eq 1 and b eq 2 or c eq 3").unwrap();
        assert_eq!(
            node,
            FilterNode::or(vec![
                FilterNode::and(vec![
                    leaf("a", Operator::Eq, Value::Int64(1)),
                    leaf("b", Operator::Eq, Value::Int64(2)),
                ]),
                leaf("c", Operator::Eq, Value::Int64(3)),
            ])
        );

        let node = parse_filters("a eq 1 or b eq 2 and c eq 3").unwrap();
        match node {
            FilterNode::Operation(op) => {
                assert_eq!(op.op, LogicalOp::And);
                assert!(matches!(
                    &op.children[0],
                    FilterNode::Operation(inner) if inner.op == LogicalOp::Or
                ));
            }
            other => panic!("unexpected node: {:?}", other),
        }
    }

    #[test]
    fn test_parse_parentheses() {
        let node = parse_filters("status eq 'active' and (amount gt 100 or amount lt 10)").unwrap();
        assert_eq!(
            node,
            FilterNode::and(vec![
                leaf("status", Operator::Eq, Value::from("active")),
                FilterNode::or(vec![
                    leaf("amount", Operator::Gt, Value::Int64(100)),
                    leaf("amount", Operator::Lt, Value::Int64(10)),
                ]),
            ])
        );

        let nested = parse_filters("((a eq 1))").unwrap();
        assert_eq!(nested, leaf("a", Operator::Eq, Value::Int64(1)));
    }

    #[test]
    fn test_parse_keywords_case_insensitive() {
        let node = parse_filters("a EQ 1 AND b Gt 2.5 Or c eq NULL").unwrap();
        let exprs = node.expressions();
        assert_eq!(exprs.len(), 3);
        assert_eq!(exprs[1].value(), &FilterValue::Single(Value::Float64(2.5)));
        assert!(exprs[2].value().is_null());
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(
            parse_filters("approved eq true").unwrap(),
            leaf("approved", Operator::Eq, Value::Boolean(true))
        );
        assert_eq!(
            parse_filters("approved ne FALSE").unwrap(),
            leaf("approved", Operator::Ne, Value::Boolean(false))
        );
        assert_eq!(
            parse_filters(r"name eq 'O\'Brien'").unwrap(),
            leaf("name", Operator::Eq, Value::from("O'Brien"))
        );
        assert_eq!(
            parse_filters("amount bw [10,20]").unwrap(),
            leaf("amount", Operator::Bw, vec![Value::Int64(10), Value::Int64(20)])
        );
        assert_eq!(
            parse_filters(r#"status in ['a', "b"]"#).unwrap(),
            leaf("status", Operator::In, vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn test_parse_null_operators() {
        assert!(parse_filters("flag eq null").is_ok());
        assert!(parse_filters("flag ne null").is_ok());

        let err = parse_filters("flag gt null").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_parse_bw_arity() {
        let err = parse_filters("amount bw [10,20,30]").unwrap_err();
        assert!(matches!(err, Error::InvalidValueShape { .. }));

        let err = parse_filters("amount eq [10,20]").unwrap_err();
        assert!(matches!(err, Error::InvalidValueShape { .. }));
    }

    #[test]
    fn test_parse_rejects_signed_and_exponent_numbers() {
        assert_eq!(syntax_position(parse_filters("a gt -1").unwrap_err()), 5);
        assert_eq!(syntax_position(parse_filters("a gt 1e5").unwrap_err()), 6);
    }

    #[test]
    fn test_parse_error_positions() {
        assert_eq!(syntax_position(parse_filters("a xx 1").unwrap_err()), 2);
        assert_eq!(syntax_position(parse_filters("a eq").unwrap_err()), 4);
        assert_eq!(syntax_position(parse_filters("a eq 1 b eq 2").unwrap_err()), 7);
        assert_eq!(syntax_position(parse_filters("(a eq 1").unwrap_err()), 7);
        assert_eq!(syntax_position(parse_filters("a eq 1)").unwrap_err()), 6);
        assert_eq!(syntax_position(parse_filters("a eq 'open").unwrap_err()), 5);
        assert_eq!(syntax_position(parse_filters("a eq1").unwrap_err()), 2);
        assert_eq!(syntax_position(parse_filters("   ").unwrap_err()), 3);
    }

    #[test]
    fn test_parse_error_carries_input() {
        let input = "status eq 'active' and";
        match parse_filters(input).unwrap_err() {
            Error::Syntax(e) => {
                assert_eq!(e.input, input);
                assert_eq!(e.position, input.len());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_display_round_trip() {
        let inputs = [
            "a eq 1 and b eq 2",
            "status eq 'it\\'s' or (amount bw [1, 2.5] and flag eq null)",
            "a in ['x', 'y'] and b ge 3 or c lt 4",
            "price lt 0.00001 or price gt 100000000000000000000.5",
            "price in [0.0000125, 2.0]",
        ];
        for input in inputs {
            let node = parse_filters(input).unwrap();
            let rendered = node.to_string();
            assert_eq!(parse_filters(&rendered).unwrap(), node, "{}", rendered);
        }
    }

    #[test]
    fn test_parse_nesting_limit() {
        let parser = FilterParser::new(2, DEFAULT_MAX_FILTER_TERMS);
        assert!(parser.parse("((a eq 1))").is_ok());
        assert!(parser.parse("(a eq 1) and (b eq 2 or (c eq 3))").is_ok());

        let err = parser.parse("((( a eq 1)))").unwrap_err();
        assert_eq!(syntax_position(err), 2);
    }

    #[test]
    fn test_parse_term_limit() {
        let parser = FilterParser::new(DEFAULT_MAX_FILTER_DEPTH, 3);
        assert!(parser.parse("a eq 1 and b eq 2 or c eq 3").is_ok());

        let err = parser.parse("a eq 1 and b eq 2 or c eq 3 and d eq 4").unwrap_err();
        assert_eq!(syntax_position(err), 32);
    }

    #[test]
    fn test_parse_hostile_input_on_small_stack() {
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                for n in [1_000, 6_000] {
                    let nested = format!("{}a eq 1{}", "(".repeat(n), ")".repeat(n));
                    assert!(matches!(parse_filters(&nested), Err(Error::Syntax(_))));
                }

                let chain = vec!["a eq 1"; 50_000].join(" and ");
                assert!(matches!(parse_filters(&chain), Err(Error::Syntax(_))));

                // The largest accepted tree is still safe to walk and drop.
                let chain = vec!["a eq 1"; DEFAULT_MAX_FILTER_TERMS].join(" and ");
                let node = parse_filters(&chain).unwrap();
                assert_eq!(node.canonical_key(), node.clone().canonical_key());
                assert_eq!(parse_filters(&node.to_string()).unwrap(), node);
            })
            .unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_parse_leaves_definitions_unbound() {
        let node = parse_filters("a eq 1").unwrap();
        let exprs: Vec<&Expression> = node.expressions();
        assert!(exprs[0].definition().is_none());
    }
}
