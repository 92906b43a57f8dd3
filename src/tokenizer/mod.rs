//! Tokenizer for BASIC statement text
//!
//! Splits a single statement (line number already removed) into tokens for the
//! expression and statement parsers. Identifiers are case-insensitive and are
//! normalised to upper case; a trailing `$` marks a string name.

use crate::error::{BasicError, Result};
use std::collections::HashMap;

/// Represents a single token in a BASIC statement
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Reserved word appearing inside a statement (TO, STEP, THEN, ...)
    Keyword(Keyword),
    /// Numeric literal
    Number(f64),
    /// String literal, quotes removed
    String(String),
    /// Variable, array or function name
    Identifier(String),
    /// Arithmetic and comparison operators (`+`, `<=`, `<>`, ...)
    Operator(&'static str),
    /// Separators (`(`, `)`, `,`, `;`)
    Separator(char),
}

/// Reserved words recognised inside statement bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    To,
    Step,
    Then,
    Goto,
    Gosub,
    And,
    Or,
    Not,
}

// Reserved words that may not be used as variable names
const KEYWORDS: &[(&str, Keyword)] = &[
    ("TO", Keyword::To),
    ("STEP", Keyword::Step),
    ("THEN", Keyword::Then),
    ("GOTO", Keyword::Goto),
    ("GOSUB", Keyword::Gosub),
    ("AND", Keyword::And),
    ("OR", Keyword::Or),
    ("NOT", Keyword::Not),
];

/// Create the keyword lookup table used during tokenization
pub fn create_keyword_map() -> HashMap<&'static str, Keyword> {
    KEYWORDS.iter().copied().collect()
}

/// Tokenize the text of one statement
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let keywords = create_keyword_map();
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];

        if ch.is_whitespace() {
            pos += 1;
            continue;
        }

        if ch == '"' {
            let start = pos + 1;
            let end = chars[start..]
                .iter()
                .position(|&c| c == '"')
                .map(|offset| start + offset)
                .ok_or_else(|| BasicError::syntax("unterminated string"))?;
            tokens.push(Token::String(chars[start..end].iter().collect()));
            pos = end + 1;
            continue;
        }

        if ch.is_ascii_digit() || (ch == '.' && chars.get(pos + 1).map_or(false, |c| c.is_ascii_digit())) {
            let (value, next) = scan_number(&chars, pos)?;
            tokens.push(Token::Number(value));
            pos = next;
            continue;
        }

        if ch.is_ascii_alphabetic() {
            let start = pos;
            while pos < chars.len() && chars[pos].is_ascii_alphanumeric() {
                pos += 1;
            }
            let mut word: String = chars[start..pos].iter().collect::<String>().to_ascii_uppercase();
            if pos < chars.len() && chars[pos] == '$' {
                word.push('$');
                pos += 1;
            }
            match keywords.get(word.as_str()) {
                Some(keyword) => tokens.push(Token::Keyword(*keyword)),
                None => tokens.push(Token::Identifier(word)),
            }
            continue;
        }

        let next = chars.get(pos + 1).copied();
        let operator = match (ch, next) {
            ('<', Some('>')) => Some("<>"),
            ('<', Some('=')) => Some("<="),
            ('>', Some('=')) => Some(">="),
            ('+', _) => Some("+"),
            ('-', _) => Some("-"),
            ('*', _) => Some("*"),
            ('/', _) => Some("/"),
            ('^', _) => Some("^"),
            ('=', _) => Some("="),
            ('<', _) => Some("<"),
            ('>', _) => Some(">"),
            _ => None,
        };
        if let Some(op) = operator {
            tokens.push(Token::Operator(op));
            pos += op.len();
            continue;
        }

        match ch {
            '(' | ')' | ',' | ';' => {
                tokens.push(Token::Separator(ch));
                pos += 1;
            }
            _ => return Err(BasicError::syntax(format!("unexpected character '{}'", ch))),
        }
    }

    Ok(tokens)
}

/// Scan a numeric literal starting at `start`, returning its value and the next position
fn scan_number(chars: &[char], start: usize) -> Result<(f64, usize)> {
    let mut pos = start;
    while pos < chars.len() && chars[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < chars.len() && chars[pos] == '.' {
        pos += 1;
        while pos < chars.len() && chars[pos].is_ascii_digit() {
            pos += 1;
        }
    }

    // Exponent only when followed by digits, so `1E` stays a number then a name
    if pos < chars.len() && (chars[pos] == 'E' || chars[pos] == 'e') {
        let mut probe = pos + 1;
        if probe < chars.len() && (chars[probe] == '+' || chars[probe] == '-') {
            probe += 1;
        }
        if probe < chars.len() && chars[probe].is_ascii_digit() {
            pos = probe;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
        }
    }

    let text: String = chars[start..pos].iter().collect();
    let value = text
        .parse::<f64>()
        .map_err(|_| BasicError::syntax(format!("invalid number '{}'", text)))?;
    Ok((value, pos))
}

/// Split a raw input line into its leading line number and the remaining text.
///
/// Returns `None` when the line does not start with a digit.
pub fn split_line_number(raw: &str) -> Option<(&str, &str)> {
    let trimmed = raw.trim_start();
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let (number, rest) = trimmed.split_at(digits);
    Some((number, rest.trim()))
}

/// Parse a line-number literal, rejecting zero and overflow
pub fn parse_line_number(text: &str) -> Result<u32> {
    match text.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(BasicError::syntax(format!("bad line number '{}'", text.trim()))),
        Ok(number) => Ok(number),
    }
}

/// Extract the leading command keyword of a statement.
///
/// The keyword is the maximal run of letters, optionally followed by `$`.
/// A leading `?` is shorthand for PRINT.
pub fn split_keyword(statement: &str) -> (String, &str) {
    let text = statement.trim_start();
    if let Some(rest) = text.strip_prefix('?') {
        return ("PRINT".to_string(), rest);
    }
    let mut end = text
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    if text[end..].starts_with('$') && end > 0 {
        end += 1;
    }
    (text[..end].to_ascii_uppercase(), &text[end..])
}

/// Find a reserved word outside string literals, returning its byte offset.
///
/// The match must be delimited by non-alphanumeric characters on both sides.
pub fn find_keyword(text: &str, word: &str) -> Option<usize> {
    let upper = text.to_ascii_uppercase();
    let bytes = upper.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            in_string = !in_string;
        } else if !in_string && bytes[i..].starts_with(word.as_bytes()) {
            let before_ok = i == 0 || !bytes[i - 1].is_ascii_alphanumeric();
            let after = i + word.len();
            let after_ok = after >= bytes.len() || !bytes[after].is_ascii_alphanumeric();
            if before_ok && after_ok {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}
