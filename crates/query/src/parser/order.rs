//! Comma-list parsers for `orderBy` and `select`.

use crate::ast::{OrderByNode, SortOrder};
use crate::lexer::Cursor;
use qopt_core::{Error, Result};

/// Parses `property [asc|desc] (, property [asc|desc])*`. Blank input yields
/// no clauses.
pub fn parse_order_by(input: &str) -> Result<Vec<OrderByNode>> {
    let mut cursor = Cursor::new(input);
    let mut nodes = Vec::new();
    cursor.skip_whitespace();
    if cursor.is_eof() {
        return Ok(nodes);
    }

    loop {
        cursor.skip_whitespace();
        let property = expect_property(&mut cursor)?;
        cursor.skip_whitespace();

        let mut direction = SortOrder::Asc;
        if !matches!(cursor.peek(), None | Some(',')) {
            let start = cursor.pos();
            direction = match cursor.scan_identifier() {
                Some(word) if word.eq_ignore_ascii_case("asc") => SortOrder::Asc,
                Some(word) if word.eq_ignore_ascii_case("desc") => SortOrder::Desc,
                Some(word) => {
                    return Err(
                        cursor.error_at(format!("Unknown sort direction '{}'", word), start)
                    );
                }
                None => {
                    return Err(unexpected_separator(&cursor));
                }
            };
            cursor.skip_whitespace();
        }
        nodes.push(OrderByNode::new(property, direction));

        if !next_item(&mut cursor)? {
            return Ok(nodes);
        }
    }
}

/// Parses `property (, property)*`. Blank input yields no properties.
pub fn parse_select(input: &str) -> Result<Vec<String>> {
    let mut cursor = Cursor::new(input);
    let mut names = Vec::new();
    cursor.skip_whitespace();
    if cursor.is_eof() {
        return Ok(names);
    }

    loop {
        cursor.skip_whitespace();
        names.push(expect_property(&mut cursor)?.to_string());
        cursor.skip_whitespace();
        if !next_item(&mut cursor)? {
            return Ok(names);
        }
    }
}

fn expect_property<'a>(cursor: &mut Cursor<'a>) -> Result<&'a str> {
    cursor
        .scan_identifier()
        .ok_or_else(|| cursor.error(format!("Expected property name, found {}", cursor.found())))
}

/// Consumes a separating comma. Returns false at the end of input.
fn next_item(cursor: &mut Cursor<'_>) -> Result<bool> {
    match cursor.peek() {
        None => Ok(false),
        Some(',') => {
            cursor.advance();
            Ok(true)
        }
        Some(_) => Err(unexpected_separator(cursor)),
    }
}

fn unexpected_separator(cursor: &Cursor<'_>) -> Error {
    cursor.error(format!(
        "Expected ',' or end of input, found {}",
        cursor.found()
    ))
}
