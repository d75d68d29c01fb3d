//! SQL-aware statement splitting
//!
//! Scripts are tokenized with `sqlparser` so that semicolons inside string
//! literals, quoted identifiers and comments are never treated as terminators.
//! `BEGIN ... END` and `CASE ... END` blocks are tracked so trigger and routine
//! bodies stay in one statement. Statements are sliced out of the original
//! text, so whatever the tokenizer normalizes never reaches the server.
//!
//! Client-side `DELIMITER` directives are not understood.

use crate::adapter::Backend;
use crate::error::{MigrateError, Result};
use sqlparser::dialect::{Dialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::tokenizer::{Location, Token, TokenWithSpan, Tokenizer};

fn dialect(backend: Backend) -> Box<dyn Dialect> {
    match backend {
        Backend::Sqlite => Box::new(SQLiteDialect {}),
        Backend::Postgres => Box::new(PostgreSqlDialect {}),
        Backend::Mysql => Box::new(MySqlDialect {}),
    }
}

fn tokenize(sql: &str, backend: Backend) -> Result<Vec<TokenWithSpan>> {
    Tokenizer::new(dialect(backend).as_ref(), sql)
        .tokenize_with_location()
        .map_err(|e| MigrateError::Tokenize(e.to_string()))
}

/// Split a script into individual statements, without their terminators.
pub fn split_statements(sql: &str, backend: Backend) -> Result<Vec<String>> {
    let tokens = tokenize(sql, backend)?;

    let significant: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| !matches!(t.token, Token::Whitespace(_) | Token::EOF))
        .map(|(i, _)| i)
        .collect();

    let lines = line_starts(sql);
    let mut statements = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut has_code = false;
    let mut skip_keyword = false;

    for (pos, &index) in significant.iter().enumerate() {
        let token = &tokens[index].token;

        if matches!(token, Token::SemiColon) && depth == 0 {
            let end = byte_offset(sql, &lines, tokens[index].span.start);
            if has_code {
                statements.push(sql[start..end].trim().to_string());
            }
            start = end + 1;
            has_code = false;
            continue;
        }
        has_code = true;

        if std::mem::take(&mut skip_keyword) {
            continue;
        }

        let Some(keyword) = bare_word(token) else {
            continue;
        };
        let next = significant
            .get(pos + 1)
            .and_then(|&i| bare_word(&tokens[i].token));

        match keyword.as_str() {
            "BEGIN" if !starts_transaction(next.as_deref(), &tokens, &significant, pos) => {
                depth += 1
            }
            "CASE" => depth += 1,
            "END" => match next.as_deref() {
                Some("IF" | "LOOP" | "WHILE" | "REPEAT") => skip_keyword = true,
                Some("CASE") => {
                    depth = depth.saturating_sub(1);
                    skip_keyword = true;
                }
                _ => depth = depth.saturating_sub(1),
            },
            _ => {}
        }
    }

    if has_code {
        let rest = sql[start.min(sql.len())..].trim();
        if !rest.is_empty() {
            statements.push(rest.to_string());
        }
    }

    Ok(statements)
}

/// Leading keyword of the first top-level statement that controls transactions.
///
/// Comments before a statement are skipped.
pub fn find_transaction_control(sql: &str, backend: Backend) -> Result<Option<String>> {
    for statement in split_statements(sql, backend)? {
        let tokens = tokenize(&statement, backend)?;
        let mut words = tokens
            .iter()
            .filter(|t| !matches!(t.token, Token::Whitespace(_) | Token::EOF))
            .map(|t| bare_word(&t.token));
        let Some(Some(first)) = words.next() else {
            continue;
        };
        let keyword = match first.as_str() {
            "BEGIN" | "COMMIT" | "ROLLBACK" | "END" | "ABORT" | "SAVEPOINT" | "RELEASE" => {
                first.clone()
            }
            "START" if matches!(words.next(), Some(Some(ref w)) if w == "TRANSACTION") => {
                "START TRANSACTION".to_string()
            }
            _ => continue,
        };
        return Ok(Some(keyword));
    }
    Ok(None)
}

/// Uppercased value of an unquoted word token
fn bare_word(token: &Token) -> Option<String> {
    match token {
        Token::Word(word) if word.quote_style.is_none() => Some(word.value.to_ascii_uppercase()),
        _ => None,
    }
}

/// `BEGIN;`, `BEGIN WORK`, `BEGIN IMMEDIATE` and the like open a transaction, not a block.
fn starts_transaction(
    next_word: Option<&str>,
    tokens: &[TokenWithSpan],
    significant: &[usize],
    pos: usize,
) -> bool {
    if matches!(
        next_word,
        Some("WORK" | "TRANSACTION" | "DEFERRED" | "IMMEDIATE" | "EXCLUSIVE" | "ISOLATION" | "READ")
    ) {
        return true;
    }
    match significant.get(pos + 1) {
        None => true,
        Some(&i) => matches!(tokens[i].token, Token::SemiColon),
    }
}

fn line_starts(sql: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(sql.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// Byte offset of a 1-based line/column (columns count chars).
fn byte_offset(sql: &str, lines: &[usize], location: Location) -> usize {
    let Some(&line_start) = lines.get(location.line.saturating_sub(1) as usize) else {
        return sql.len();
    };
    let column = location.column.saturating_sub(1) as usize;
    sql[line_start..]
        .char_indices()
        .nth(column)
        .map(|(i, _)| line_start + i)
        .unwrap_or(sql.len())
}
