//! Character-level scanners shared by the option parsers.
//!
//! A [`Cursor`] walks the input by byte offset. Every scanner either consumes
//! the token it recognizes or leaves the cursor untouched and reports a
//! syntax error carrying the offset and the complete input.

use qopt_core::{Error, Result, Value};

/// Parser state over one option string.
pub(crate) struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    pub fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Builds a syntax error at the current position.
    pub fn error(&self, message: impl Into<String>) -> Error {
        self.error_at(message, self.pos)
    }

    pub fn error_at(&self, message: impl Into<String>, position: usize) -> Error {
        Error::syntax(message, position, self.input)
    }

    /// Describes the next character for error messages.
    pub fn found(&self) -> String {
        match self.peek() {
            Some(c) => format!("'{}'", c),
            None => "end of input".to_string(),
        }
    }

    pub fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            _ => Err(self.error(format!("Expected '{}', found {}", expected, self.found()))),
        }
    }

    /// True at end of input, whitespace or a parenthesis.
    pub fn at_word_end(&self) -> bool {
        match self.peek() {
            None | Some('(') | Some(')') => true,
            Some(c) => c.is_whitespace(),
        }
    }

    /// True at end of input, whitespace or a closing parenthesis.
    pub fn at_value_end(&self) -> bool {
        matches!(self.peek(), None | Some(')')) || self.peek().is_some_and(char::is_whitespace)
    }

    /// Scans `(alnum | '.' | '_')+`.
    pub fn scan_identifier(&mut self) -> Option<&'a str> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_identifier_char(c) {
                self.advance();
            } else {
                break;
            }
        }
        if self.pos == start {
            None
        } else {
            Some(&self.input[start..self.pos])
        }
    }

    /// Consumes `keyword` (ASCII case-insensitive) when it stands as a whole
    /// word followed by whitespace, a parenthesis or the end of input.
    pub fn scan_keyword(&mut self, keyword: &str) -> bool {
        let rest = &self.input[self.pos..];
        let Some(head) = rest.get(..keyword.len()) else {
            return false;
        };
        if !head.eq_ignore_ascii_case(keyword) {
            return false;
        }
        let start = self.pos;
        self.pos += keyword.len();
        if self.at_word_end() {
            true
        } else {
            self.pos = start;
            false
        }
    }

    /// Scans an unsigned decimal: digits with at most one `.` followed by
    /// more digits. Integers become [`Value::Int64`], the rest
    /// [`Value::Float64`].
    pub fn scan_number(&mut self) -> Result<Value> {
        let start = self.pos;
        self.skip_digits();
        if self.pos == start {
            return Err(self.error(format!("Expected number, found {}", self.found())));
        }
        let mut is_float = false;
        if self.peek() == Some('.') {
            self.advance();
            let fraction = self.pos;
            self.skip_digits();
            if self.pos == fraction {
                return Err(self.error_at("Invalid number", start));
            }
            is_float = true;
        }
        if matches!(self.peek(), Some('.')) {
            return Err(self.error_at("Invalid number", start));
        }

        let text = &self.input[start..self.pos];
        if is_float {
            text.parse::<f64>()
                .map(Value::Float64)
                .map_err(|_| self.error_at("Invalid number", start))
        } else {
            text.parse::<i64>()
                .map(Value::Int64)
                .map_err(|_| self.error_at("Integer literal out of range", start))
        }
    }

    fn skip_digits(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Scans a single-quoted string; `\'` stands for a quote.
    pub fn scan_quoted_string(&mut self) -> Result<String> {
        let start = self.pos;
        if self.peek() != Some('\'') {
            return Err(self.error(format!("Expected string literal, found {}", self.found())));
        }
        self.advance();

        let mut out = String::new();
        while let Some(c) = self.peek() {
            match c {
                '\'' => {
                    self.advance();
                    return Ok(out);
                }
                '\\' => {
                    self.advance();
                    match self.peek() {
                        Some('\'') => {
                            out.push('\'');
                            self.advance();
                        }
                        _ => out.push('\\'),
                    }
                }
                _ => {
                    out.push(c);
                    self.advance();
                }
            }
        }
        self.pos = start;
        Err(self.error("Unterminated string"))
    }

    /// Scans a bracketed array of scalars.
    ///
    /// The closing bracket is found by depth counting outside of quotes.
    /// Single and double quoted elements are both accepted; the text is
    /// rewritten to double quotes and decoded as JSON.
    pub fn scan_array(&mut self) -> Result<Vec<Value>> {
        let start = self.pos;
        if self.peek() != Some('[') {
            return Err(self.error(format!("Expected '[', found {}", self.found())));
        }
        let end = self
            .find_array_end()
            .ok_or_else(|| self.error_at("Unterminated array literal", start))?;
        let raw = &self.input[start..end];

        let decoded: Vec<serde_json::Value> = serde_json::from_str(&normalize_quotes(raw))
            .map_err(|e| self.error_at(format!("Invalid array literal: {}", e), start))?;

        let mut values = Vec::with_capacity(decoded.len());
        for element in decoded {
            match Value::try_from(element) {
                Ok(Value::Null) => {
                    return Err(self.error_at("Array elements must not be null", start));
                }
                Ok(value) => values.push(value),
                Err(_) => {
                    return Err(self.error_at("Array elements must be scalars", start));
                }
            }
        }
        self.pos = end;
        Ok(values)
    }

    /// Returns the offset just past the bracket closing the array at the
    /// cursor.
    fn find_array_end(&self) -> Option<usize> {
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut escaped = false;
        for (offset, c) in self.input[self.pos..].char_indices() {
            if let Some(q) = quote {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '\'' | '"' => quote = Some(c),
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(self.pos + offset + 1);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

#[inline]
pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Rewrites single-quoted strings inside an array literal as JSON strings.
fn normalize_quotes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\'' && c != '"' {
            out.push(c);
            continue;
        }
        let quote = c;
        out.push('"');
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(next) if next == quote && quote == '\'' => out.push('\''),
                    Some(next) => {
                        out.push('\\');
                        out.push(next);
                    }
                    None => out.push('\\'),
                },
                c if c == quote => break,
                '"' => out.push_str("\\\""),
                c => out.push(c),
            }
        }
        out.push('"');
    }
    out
}

/// Splits `input` on `separator` where it is not nested inside parentheses,
/// brackets or quotes. Returns each piece with its byte offset, or the offset
/// of the first unbalanced character.
pub(crate) fn split_top_level(
    input: &str,
    separator: char,
) -> core::result::Result<Vec<(usize, &str)>, usize> {
    let mut pieces = Vec::new();
    let mut stack: Vec<char> = Vec::new();
    let mut quote: Option<(char, usize)> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        if let Some((q, _)) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some((c, i)),
            '(' | '[' => stack.push(c),
            ')' => {
                if stack.pop() != Some('(') {
                    return Err(i);
                }
            }
            ']' => {
                if stack.pop() != Some('[') {
                    return Err(i);
                }
            }
            c if c == separator && stack.is_empty() => {
                pieces.push((start, &input[start..i]));
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if let Some((_, at)) = quote {
        return Err(at);
    }
    if !stack.is_empty() {
        return Err(input.len());
    }
    pieces.push((start, &input[start..]));
    Ok(pieces)
}
