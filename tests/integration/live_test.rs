//! Execution tests against a live server.
//!
//! Skipped unless DATABASE_URL points at a CockroachDB or PostgreSQL server.

use sql_shell::config::ConnectionConfig;
use sql_shell::db::{PostgresConnection, Statement, Value};
use sql_shell::error::ShellError;
use sql_shell::output::OutputSink;
use sql_shell::query::{run_query, Outcome, QueryExecutor};

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

/// Helper to open a test connection.
async fn get_test_connection() -> Option<PostgresConnection> {
    let url = get_test_database_url()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    PostgresConnection::connect(&config).await.ok()
}

#[tokio::test]
async fn test_set_statement_is_acknowledged() {
    let Some(mut conn) = get_test_connection().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let outcome = QueryExecutor::new(&mut conn)
        .execute(&Statement::new("SET application_name = 'sql-shell-test'"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Acknowledgement);

    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_select_with_placeholder() {
    let Some(mut conn) = get_test_connection().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let mut sink = OutputSink::new(Vec::new());
    run_query(
        &mut conn,
        &mut sink,
        "SELECT 1::INT8 AS num, $1::TEXT AS name",
        vec!["descriptor".into()],
    )
    .await
    .unwrap();

    let expected = "\
+-----+------------+
| num |    name    |
+-----+------------+
| 1   | descriptor |
+-----+------------+
";
    assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), expected);

    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_numeric_placeholder_accepts_text_and_int() {
    let Some(mut conn) = get_test_connection().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let sql = "SELECT n FROM generate_series(1, 5) AS g(n) WHERE n = $1";
    let expected = "\
+---+
| n |
+---+
| 3 |
+---+
";

    for param in [Value::from("3"), Value::Int(3)] {
        let mut sink = OutputSink::new(Vec::new());
        run_query(&mut conn, &mut sink, sql, vec![param])
            .await
            .unwrap();
        assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), expected);
    }

    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_zero_row_select_keeps_columns() {
    let Some(mut conn) = get_test_connection().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let outcome = QueryExecutor::new(&mut conn)
        .execute(&Statement::new("SELECT 1 AS a, 2 AS b WHERE false"))
        .await
        .unwrap();

    match outcome {
        Outcome::Rows(rs) => {
            assert_eq!(rs.columns(), &["a".to_string(), "b".to_string()][..]);
            assert_eq!(rs.row_count(), 0);
        }
        other => panic!("Expected rows, got {:?}", other),
    }

    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_syntax_error_is_query_error() {
    let Some(mut conn) = get_test_connection().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let err = QueryExecutor::new(&mut conn)
        .execute(&Statement::new("SELEC 1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ShellError::Query(_)));

    // The connection stays usable after a failed statement.
    let outcome = QueryExecutor::new(&mut conn)
        .execute(&Statement::new("SELECT 1"))
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Rows(_)));

    conn.close().await.unwrap();
}
