//! Minimal SQL helpers for migration files
//!
//! Just enough lexing to split a migration into statements and pull table names
//! out of `CREATE TABLE`. Nothing here understands SQL grammar beyond quoting
//! and comments.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use regex::Regex;

/// Why a migration could not be split into statements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    UnterminatedQuote(char),
    UnterminatedComment,
}

impl fmt::Display for SplitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitError::UnterminatedQuote(q) => write!(f, "unterminated {} quoted string", q),
            SplitError::UnterminatedComment => write!(f, "unterminated /* block comment"),
        }
    }
}

impl std::error::Error for SplitError {}

/// Split SQL text into trimmed statements.
///
/// `;` terminates a statement unless it sits inside `'`, `"` or `` ` `` quotes.
/// `--` and `#` line comments and `/* */` block comments are dropped.
pub fn split_statements(sql: &str) -> Result<Vec<String>, SplitError> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' => read_quoted(c, &mut chars, &mut current)?,
            '-' if chars.peek() == Some(&'-') => {
                skip_line(&mut chars);
                current.push('\n');
            }
            '#' => {
                skip_line(&mut chars);
                current.push('\n');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                skip_block_comment(&mut chars)?;
                current.push(' ');
            }
            ';' => {
                push_statement(&mut statements, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_statement(&mut statements, &current);

    Ok(statements)
}

fn push_statement(statements: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}

fn read_quoted(quote: char, chars: &mut Peekable<Chars<'_>>, out: &mut String) -> Result<(), SplitError> {
    out.push(quote);
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '\\' && quote != '`' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
            continue;
        }
        if c == quote {
            // doubled quote is an escaped quote
            if chars.peek() == Some(&quote) {
                out.push(quote);
                chars.next();
                continue;
            }
            return Ok(());
        }
    }
    Err(SplitError::UnterminatedQuote(quote))
}

fn skip_line(chars: &mut Peekable<Chars<'_>>) {
    for c in chars.by_ref() {
        if c == '\n' {
            break;
        }
    }
}

fn skip_block_comment(chars: &mut Peekable<Chars<'_>>) -> Result<(), SplitError> {
    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'/') {
            chars.next();
            return Ok(());
        }
    }
    Err(SplitError::UnterminatedComment)
}

/// Extracts table names from `CREATE TABLE` statements
pub struct TableNameExtractor {
    create_table: Regex,
}

impl Default for TableNameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TableNameExtractor {
    pub fn new() -> Self {
        Self {
            create_table: Regex::new(
                r"(?is)^create\s+(?:temporary\s+)?table\s+(?:if\s+not\s+exists\s+)?(?:`?[\w$]+`?\.)?`?([\w$]+)`?",
            )
            .expect("static regex"),
        }
    }

    /// Table created by `statement`, if it is a `CREATE TABLE`
    pub fn created_table(&self, statement: &str) -> Option<String> {
        self.create_table
            .captures(statement.trim_start())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// First keyword of a statement, uppercased
pub fn leading_keyword(statement: &str) -> String {
    statement
        .trim_start()
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase()
}
