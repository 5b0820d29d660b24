//! Splitting raw SQL scripts into single statements.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::{MigrateResult, MigrationError};

/// Line comments (`-- ...`) and block comments (`/* ... */`).
static COMMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)/\*.*?\*/|--[^\n]*").expect("comment pattern is valid")
});

/// Split a SQL script into its statements.
///
/// Comments are removed first. Statements are terminated by `;`, trimmed, and
/// have newlines, tabs and runs of spaces folded into single spaces. Empty
/// statements are dropped. Text after the last `;` is an error, so a script
/// missing its final semicolon never loses its last statement silently.
///
/// ```rust
/// use tally_migrate::split_statements;
///
/// let stmts = split_statements("CREATE TABLE t (id INT);\nINSERT INTO t VALUES (1);").unwrap();
/// assert_eq!(stmts, vec!["CREATE TABLE t (id INT)", "INSERT INTO t VALUES (1)"]);
/// ```
pub fn split_statements(raw: &str) -> MigrateResult<Vec<String>> {
    let stripped = COMMENTS.replace_all(raw, " ");

    let mut statements = Vec::new();
    let mut buf = String::new();
    let mut last = '\0';

    for c in stripped.chars() {
        if c == ';' {
            let stmt = buf.trim();
            if !stmt.is_empty() {
                statements.push(stmt.to_string());
            }
            buf.clear();
            continue;
        }

        let c = match c {
            '\r' | '\n' | '\t' => ' ',
            other => other,
        };
        if last == ' ' && c == ' ' {
            continue;
        }
        last = c;
        buf.push(c);
    }

    if !buf.trim().is_empty() {
        return Err(MigrationError::syntax(format!(
            "non terminated sql statement: {}",
            buf.trim()
        )));
    }

    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_comment_removed() {
        let stmts =
            split_statements("INSERT INTO t VALUES (1); -- comment\nINSERT INTO t VALUES (2);")
                .unwrap();
        assert_eq!(
            stmts,
            vec!["INSERT INTO t VALUES (1)", "INSERT INTO t VALUES (2)"]
        );
    }

    #[test]
    fn test_block_comment_spanning_lines() {
        let sql = "/* header\n   more header; with semicolon */\nCREATE TABLE a (id INT);";
        let stmts = split_statements(sql).unwrap();
        assert_eq!(stmts, vec!["CREATE TABLE a (id INT)"]);
    }

    #[test]
    fn test_missing_final_semicolon() {
        let err = split_statements("INSERT INTO t VALUES (1)").unwrap_err();
        assert!(matches!(err, MigrationError::Syntax(_)));

        let err = split_statements("SELECT 1; SELECT 2").unwrap_err();
        assert!(err.to_string().contains("SELECT 2"));
    }

    #[test]
    fn test_empty_statements_dropped() {
        assert!(split_statements(";;").unwrap().is_empty());
        assert!(split_statements("  \n\t ").unwrap().is_empty());
        assert_eq!(split_statements("SELECT 1;;;").unwrap(), vec!["SELECT 1"]);
    }

    #[test]
    fn test_whitespace_folded() {
        let sql = "CREATE TABLE users (\r\n\tid   BIGINT,\n\tname TEXT\n);";
        let stmts = split_statements(sql).unwrap();
        assert_eq!(stmts, vec!["CREATE TABLE users ( id BIGINT, name TEXT )"]);
    }

    #[test]
    fn test_trailing_comment_after_last_statement() {
        let stmts = split_statements("SELECT 1;\n-- the end").unwrap();
        assert_eq!(stmts, vec!["SELECT 1"]);
    }
}
