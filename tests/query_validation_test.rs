//! Integration tests for query validation.
//!
//! These tests verify that the classifier rejects statements containing write, DDL,
//! privilege or procedure keywords and allows read-only queries.

use pg_readonly_mcp::error::DbError;
use pg_readonly_mcp::tools::sql_validator::{QueryVerdict, classify, scan, validate_readonly};

/// Test that INSERT is rejected with UnsafeQuery error.
#[test]
fn test_query_rejects_insert() {
    let result = validate_readonly("INSERT INTO users (name) VALUES ('test')");
    assert!(result.is_err(), "INSERT should be rejected");

    let err = result.unwrap_err();
    assert!(
        matches!(err, DbError::UnsafeQuery { .. }),
        "Should be UnsafeQuery error, got: {:?}",
        err
    );
}

/// Test that UPDATE is rejected with UnsafeQuery error.
#[test]
fn test_query_rejects_update() {
    let result = validate_readonly("UPDATE users SET name = 'changed' WHERE id = 1");
    assert!(matches!(result, Err(DbError::UnsafeQuery { .. })));
}

/// Test that DDL is rejected.
#[test]
fn test_query_rejects_ddl() {
    assert!(validate_readonly("CREATE TABLE t (id int)").is_err());
    assert!(validate_readonly("DROP TABLE users").is_err());
    assert!(validate_readonly("ALTER TABLE users ADD COLUMN x int").is_err());
    assert!(validate_readonly("TRUNCATE users").is_err());
}

/// Test that privilege and procedure statements are rejected.
#[test]
fn test_query_rejects_privileges_and_procedures() {
    assert!(validate_readonly("GRANT SELECT ON users TO intern").is_err());
    assert!(validate_readonly("REVOKE ALL ON users FROM intern").is_err());
    assert!(validate_readonly("EXECUTE prepared_stmt(1)").is_err());
    assert!(validate_readonly("EXEC sp_who").is_err());
}

/// Test that data-modifying CTEs are rejected.
#[test]
fn test_query_rejects_writable_cte() {
    let sql = r#"
        WITH moved AS (
            DELETE FROM inbox WHERE read = true RETURNING *
        )
        SELECT count(*) FROM moved
    "#;
    assert_eq!(classify(sql), QueryVerdict::Unsafe { keyword: "DELETE" });
}

/// Test that SELECT with complex joins is allowed.
#[test]
fn test_query_allows_complex_select() {
    let sql = r#"
        SELECT u.name, o.total
        FROM users u
        JOIN orders o ON u.id = o.user_id
        WHERE o.created_at > '2024-01-01'
        ORDER BY o.total DESC
        LIMIT 10
    "#;
    assert!(validate_readonly(sql).is_ok(), "Complex SELECT should be allowed");
}

/// Test that WITH (CTE) is allowed.
#[test]
fn test_query_allows_cte() {
    let sql = r#"
        WITH active_users AS (
            SELECT id, name FROM users WHERE active = true
        )
        SELECT * FROM active_users
    "#;
    assert!(validate_readonly(sql).is_ok(), "CTE should be allowed");
}

/// Test that EXPLAIN and SHOW are allowed.
#[test]
fn test_query_allows_explain_and_show() {
    assert!(validate_readonly("EXPLAIN SELECT * FROM users").is_ok());
    assert!(validate_readonly("SHOW search_path").is_ok());
}

/// Test that case-insensitive detection works.
#[test]
fn test_case_insensitive_detection() {
    for sql in [
        "insert into users values (1)",
        "INSERT INTO users VALUES (1)",
        "Insert Into Users Values (1)",
        "iNsErT iNtO uSeRs VaLuEs (1)",
    ] {
        assert_eq!(classify(sql), QueryVerdict::Unsafe { keyword: "INSERT" });
    }
}

/// Test that comments are stripped before scanning.
#[test]
fn test_sql_with_comments() {
    assert!(validate_readonly("-- This is a comment\nSELECT * FROM users").is_ok());
    assert!(validate_readonly("/* This is\na comment */ SELECT * FROM users").is_ok());
    assert!(validate_readonly("SELECT * FROM users -- then DROP TABLE users").is_ok());

    // A keyword outside the comment is still found.
    assert!(validate_readonly("-- comment\nINSERT INTO users VALUES (1)").is_err());
}

/// Test the documented gap: keywords in string literals are still rejected.
#[test]
fn test_keyword_in_string_literal_is_rejected() {
    let err = validate_readonly("SELECT * FROM logs WHERE message = 'user deleted; drop it'")
        .unwrap_err();
    assert!(err.to_string().contains("DROP"));
}

/// Test that comment markers inside literals do not hide later statements.
#[test]
fn test_comment_marker_in_literal() {
    let err = validate_readonly("SELECT 1 LIMIT 1; SELECT '--'; DROP TABLE victims").unwrap_err();
    assert!(matches!(err, DbError::UnsafeQuery { ref keyword } if keyword == "DROP"));

    assert_eq!(
        classify("SELECT '/* ' AS a; DELETE FROM t; SELECT ' */' AS b"),
        QueryVerdict::Unsafe { keyword: "DELETE" }
    );
}

/// Test that a comment between two words separates them.
#[test]
fn test_comment_between_words() {
    assert_eq!(
        classify("EXPLAIN ANALYZE/**/DELETE FROM t"),
        QueryVerdict::Unsafe { keyword: "DELETE" }
    );
}

/// Test that statements can be counted and a separator inside a literal is not one.
#[test]
fn test_statement_separators() {
    assert_eq!(scan("SELECT 1; SELECT 2").statement_count, 2);
    assert_eq!(scan("SELECT 'a;b' AS pair;").statement_count, 1);
    assert_eq!(scan("SELECT 1; /* trailing */").statement_count, 1);
}

/// Test that column names containing keywords are not rejected.
#[test]
fn test_identifiers_containing_keywords() {
    assert!(validate_readonly("SELECT last_update, created_at, is_deleted FROM t").is_ok());
    assert!(validate_readonly("SELECT * FROM grants_history").is_ok());
}

/// Test the error message.
#[test]
fn test_error_message() {
    let err = validate_readonly("INSERT INTO users VALUES (1)").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Only SELECT queries are allowed (found forbidden keyword INSERT)"
    );
}
