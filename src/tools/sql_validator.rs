//! SQL statement classification for read-only enforcement.
//!
//! The `query` tool accepts arbitrary SQL, so every statement is classified before it
//! reaches a pooled connection. Classification is a keyword deny-list, not a parser:
//!
//! 1. The text is lexed with the PostgreSQL dialect of `sqlparser` and every comment is
//!    replaced by whitespace, so a keyword cannot hide behind (or be smuggled inside)
//!    a comment. Comment markers inside string literals, quoted identifiers and
//!    dollar-quoted bodies are not comments and stay in place.
//! 2. The remaining text is uppercased.
//! 3. Any deny-listed keyword appearing as a whole word makes the statement unsafe.
//!
//! Input that does not lex (an unterminated literal, say) is scanned as raw text.
//!
//! # Known limitations
//!
//! Literal contents stay visible to the scan. A deny-listed word inside a string
//! literal or a quoted identifier (`SELECT 'drop'`) is still reported as unsafe, and a
//! read-only statement that calls a side-effecting function is still reported as safe.
//! Statement separators are not special here: `SELECT 1; SELECT 2` classifies as safe.
//! The `query` tool rejects multiple statements separately, using [`scan`].

use crate::error::{DbError, DbResult};
use regex::Regex;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer, Whitespace};
use std::sync::LazyLock;
use tracing::debug;

/// Keywords that mark a statement as a write, DDL, privilege or procedure operation.
pub const FORBIDDEN_KEYWORDS: [&str; 12] = [
    "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", "REPLACE", "GRANT",
    "REVOKE", "EXEC", "EXECUTE",
];

/// One whole-word matcher per keyword, in deny-list order.
static KEYWORD_REGEXES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    FORBIDDEN_KEYWORDS
        .iter()
        .map(|kw| {
            let re = Regex::new(&format!(r"\b{}\b", kw)).expect("Invalid regex: keyword pattern");
            (*kw, re)
        })
        .collect()
});

/// Verdict for a single SQL string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryVerdict {
    Safe,
    /// The first deny-listed keyword found.
    Unsafe { keyword: &'static str },
}

impl QueryVerdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Safe)
    }
}

/// Lexed view of a SQL string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedSql {
    /// The text with each comment replaced by whitespace.
    pub code: String,
    /// Non-empty statements separated by `;`.
    pub statement_count: usize,
    /// An unquoted `LIMIT` keyword appears outside comments and literals.
    pub has_limit: bool,
}

/// Lex `sql` with the PostgreSQL dialect.
pub fn scan(sql: &str) -> ScannedSql {
    let dialect = PostgreSqlDialect {};
    match Tokenizer::new(&dialect, sql).tokenize() {
        Ok(tokens) => scan_tokens(&tokens),
        Err(e) => {
            debug!(error = %e, "SQL did not lex, scanning raw text");
            ScannedSql {
                code: sql.to_string(),
                statement_count: sql.split(';').filter(|s| !s.trim().is_empty()).count(),
                has_limit: false,
            }
        }
    }
}

fn scan_tokens(tokens: &[Token]) -> ScannedSql {
    let mut scanned = ScannedSql {
        code: String::new(),
        statement_count: 0,
        has_limit: false,
    };
    let mut in_statement = false;

    for token in tokens {
        match token {
            // The server treats a comment as a token separator.
            Token::Whitespace(Whitespace::SingleLineComment { .. }) => scanned.code.push('\n'),
            Token::Whitespace(Whitespace::MultiLineComment(_)) => scanned.code.push(' '),
            Token::Whitespace(_) => scanned.code.push_str(&token.to_string()),
            Token::EOF => {}
            Token::SemiColon => {
                in_statement = false;
                scanned.code.push(';');
            }
            _ => {
                if !in_statement {
                    scanned.statement_count += 1;
                    in_statement = true;
                }
                if let Token::Word(word) = token {
                    if word.keyword == Keyword::LIMIT && word.quote_style.is_none() {
                        scanned.has_limit = true;
                    }
                }
                scanned.code.push_str(&token.to_string());
            }
        }
    }

    scanned
}

/// Replace `--` and `/* */` comments with whitespace.
pub fn strip_comments(sql: &str) -> String {
    scan(sql).code
}

/// Classify `sql` as safe (read-only) or unsafe.
pub fn classify(sql: &str) -> QueryVerdict {
    let normalized = strip_comments(sql).to_uppercase();

    KEYWORD_REGEXES
        .iter()
        .find(|(_, re)| re.is_match(&normalized))
        .map_or(QueryVerdict::Safe, |(keyword, _)| QueryVerdict::Unsafe {
            keyword: *keyword,
        })
}

/// Reject `sql` unless it classifies as safe.
pub fn validate_readonly(sql: &str) -> DbResult<()> {
    match classify(sql) {
        QueryVerdict::Safe => Ok(()),
        QueryVerdict::Unsafe { keyword } => Err(DbError::unsafe_query(keyword)),
    }
}
