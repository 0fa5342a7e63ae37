use super::ast::{Atom, CaseMode, Predicate};
use super::simplify::simplify;
use crate::error::{Error, Result};

/// Characters that make a bare term a regular expression
const REGEX_META: &[char] = &['\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$'];

/// Parse a query string into a simplified predicate.
///
/// Syntax: whitespace-separated terms must all match, in order. `-term`
/// negates, `( ... )` groups and `or` separates alternatives. Fields:
/// `case:yes|no|auto`, `f:`/`file:` (glob), `r:`/`repo:` (repository name
/// substring), `regex:` and `lit:` to force how a term is read.
pub fn parse_query(input: &str) -> Result<Predicate> {
    let mut parser = QueryParser::new(input);
    let predicate = parser.parse()?;
    Ok(simplify(&predicate))
}

/// Query parser
struct QueryParser<'a> {
    input: &'a str,
    pos: usize,
    case: Option<CaseMode>,
}

impl<'a> QueryParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            case: None,
        }
    }

    fn parse(&mut self) -> Result<Predicate> {
        self.skip_whitespace();
        if self.is_eof() {
            return Err(Error::invalid("empty query"));
        }

        let root = self.parse_or()?;
        self.skip_whitespace();
        if !self.is_eof() {
            return Err(Error::invalid(format!(
                "unexpected {:?} at offset {}",
                self.remaining(),
                self.pos
            )));
        }

        // case: applies to the whole query wherever it appears
        Ok(match self.case {
            Some(mode) => root.map_atoms(&mut |atom| Predicate::Atom(atom.with_case(mode))),
            None => root,
        })
    }

    fn parse_or(&mut self) -> Result<Predicate> {
        let mut nodes = vec![self.parse_and()?];

        while self.consume_keyword("or") {
            nodes.push(self.parse_and()?);
        }

        if nodes.len() == 1 {
            return Ok(nodes.swap_remove(0));
        }
        if nodes.iter().any(is_empty_and) {
            return Err(Error::invalid("empty alternative"));
        }
        Ok(Predicate::Or(nodes))
    }

    fn parse_and(&mut self) -> Result<Predicate> {
        let mut nodes = Vec::new();
        let mut terms = 0usize;

        loop {
            self.skip_whitespace();

            if self.is_eof() || self.peek_char() == Some(')') || self.at_keyword("or") {
                break;
            }

            terms += 1;
            if let Some(node) = self.parse_unary()? {
                nodes.push(node);
            }
        }

        // An empty operand would fold to `true` and widen the query
        if terms == 0 {
            return Err(Error::invalid(if self.peek_char() == Some(')') {
                "empty group"
            } else {
                "empty alternative"
            }));
        }

        Ok(Predicate::And(nodes))
    }

    fn parse_unary(&mut self) -> Result<Option<Predicate>> {
        if self.peek_char() == Some('-') {
            let after = self.remaining()[1..].chars().next();
            if after.is_some_and(|c| !c.is_whitespace()) {
                self.advance();
                return match self.parse_primary()? {
                    Some(inner) => Ok(Some(Predicate::negate(inner))),
                    None => Err(Error::invalid("case: cannot be negated")),
                };
            }
        }

        self.parse_primary()
    }

    /// Parse one operand. `None` means the token was a directive (case:)
    /// that contributes no node.
    fn parse_primary(&mut self) -> Result<Option<Predicate>> {
        // Parenthesized expression
        if self.consume_char('(') {
            let node = self.parse_or()?;
            self.skip_whitespace();
            if !self.consume_char(')') {
                return Err(Error::invalid("missing closing parenthesis"));
            }
            if is_empty_and(&node) {
                return Err(Error::invalid("empty group"));
            }
            return Ok(Some(node));
        }

        // Quoted literal
        if self.peek_char() == Some('"') {
            let text = self.parse_quoted()?;
            return Ok(Some(Atom::substring(text).into()));
        }

        self.parse_term()
    }

    fn parse_term(&mut self) -> Result<Option<Predicate>> {
        let start = self.pos;

        // Check for field prefix
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphabetic() {
                self.advance();
            } else {
                break;
            }
        }
        if self.pos > start && self.peek_char() == Some(':') {
            let field = self.input[start..self.pos].to_ascii_lowercase();
            if is_field(&field) {
                self.advance();
                let value = self.parse_value()?;
                if value.is_empty() {
                    return Err(Error::invalid(format!("missing value for {}:", field)));
                }
                return self.parse_field(&field, value);
            }
        }

        // Regular word (unknown fields stay part of it)
        self.pos = start;
        let word = self.read_word();
        if word.is_empty() {
            return Err(Error::invalid(format!(
                "unexpected {:?} at offset {}",
                self.remaining(),
                self.pos
            )));
        }
        classify(&word).map(Some)
    }

    fn parse_field(&mut self, field: &str, value: String) -> Result<Option<Predicate>> {
        let node: Predicate = match field {
            "case" => {
                self.case = Some(match value.to_ascii_lowercase().as_str() {
                    "yes" => CaseMode::Sensitive,
                    "no" => CaseMode::Insensitive,
                    "auto" => CaseMode::Auto,
                    other => {
                        return Err(Error::invalid(format!(
                            "case: expects yes, no or auto, got {:?}",
                            other
                        )))
                    }
                });
                return Ok(None);
            }
            "f" | "file" => Atom::glob(value).into(),
            "r" | "repo" => Atom::repo(value).into(),
            "regex" => {
                validate_regex(&value)?;
                Atom::regexp(value).into()
            }
            "lit" => Atom::substring(value).into(),
            other => return Err(Error::invalid(format!("unknown field {}:", other))),
        };
        Ok(Some(node))
    }

    fn parse_value(&mut self) -> Result<String> {
        if self.peek_char() == Some('"') {
            self.parse_quoted()
        } else {
            Ok(self.read_word())
        }
    }

    fn parse_quoted(&mut self) -> Result<String> {
        self.consume_char('"');
        let mut text = String::new();

        loop {
            match self.peek_char() {
                None => return Err(Error::invalid("unterminated quoted string")),
                Some('"') => {
                    self.advance();
                    return Ok(text);
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some(ch @ ('"' | '\\')) => {
                            text.push(ch);
                            self.advance();
                        }
                        _ => text.push('\\'),
                    }
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
    }

    /// Read until whitespace or a `)` that closes an enclosing group.
    /// Parentheses opened inside the word (regex groups) are balanced.
    fn read_word(&mut self) -> String {
        let start = self.pos;
        let mut depth = 0usize;

        while let Some(ch) = self.peek_char() {
            match ch {
                c if c.is_whitespace() => break,
                '\\' => {
                    self.advance();
                }
                '(' => depth += 1,
                ')' if depth == 0 => break,
                ')' => depth -= 1,
                _ => {}
            }
            self.advance();
        }

        self.input[start..self.pos].to_string()
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        let rest = self.remaining();
        match (rest.get(..keyword.len()), rest.get(keyword.len()..)) {
            (Some(head), Some(tail)) => {
                head.eq_ignore_ascii_case(keyword)
                    && tail.chars().next().is_none_or(|c| c.is_whitespace() || c == '(')
            }
            _ => false,
        }
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        self.skip_whitespace();
        if self.at_keyword(keyword) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume_char(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn remaining(&self) -> &str {
        &self.input[self.pos..]
    }
}

/// A conjunction of directives only, which would fold to `true`
fn is_empty_and(node: &Predicate) -> bool {
    matches!(node, Predicate::And(children) if children.is_empty())
}

fn is_field(field: &str) -> bool {
    matches!(field, "case" | "f" | "file" | "r" | "repo" | "regex" | "lit")
}

/// A bare word is literal text unless it contains regex syntax
fn classify(word: &str) -> Result<Predicate> {
    if word.contains(REGEX_META) {
        validate_regex(word)?;
        Ok(Atom::regexp(word).into())
    } else {
        Ok(Atom::substring(word).into())
    }
}

fn validate_regex(pattern: &str) -> Result<()> {
    regex::Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| Error::invalid(format!("bad regex {:?}: {}", pattern, e)))
}
