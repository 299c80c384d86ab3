//! Execute-and-render tests against the mock connection.
//!
//! Outputs are compared byte-for-byte with the tables the shell prints.

use pretty_assertions::assert_eq;
use sql_shell::db::{MockConnection, Value};
use sql_shell::error::ShellError;
use sql_shell::output::OutputSink;
use sql_shell::query::run_query;

fn system_namespace() -> MockConnection {
    MockConnection::new()
        .with_ack("SET DATABASE=system")
        .with_rows(
            "SHOW COLUMNS FROM system.namespace",
            &["Field", "Type", "Null"],
            vec![
                vec!["parentID".into(), "INT".into(), true.into()],
                vec!["name".into(), "STRING".into(), true.into()],
                vec!["id".into(), "INT".into(), true.into()],
            ],
        )
        .with_rows(
            "SELECT * FROM system.namespace WHERE name=$1",
            &["parentID", "name", "id"],
            vec![vec![Value::Int(1), "descriptor".into(), Value::Int(3)]],
        )
        .with_rows(
            "SELECT * FROM system.namespace WHERE false",
            &["parentID", "name", "id"],
            vec![],
        )
}

async fn run(conn: &mut MockConnection, sql: &str, params: Vec<Value>) -> String {
    let mut sink = OutputSink::new(Vec::new());
    run_query(conn, &mut sink, sql, params).await.unwrap();
    String::from_utf8(sink.into_inner()).unwrap()
}

#[tokio::test]
async fn test_set_statement_prints_ok() {
    let mut conn = system_namespace();
    let output = run(&mut conn, "SET DATABASE=system", vec![]).await;
    assert_eq!(output, "OK\n");
}

#[tokio::test]
async fn test_show_columns_table() {
    let mut conn = system_namespace();
    let output = run(&mut conn, "SHOW COLUMNS FROM system.namespace", vec![]).await;

    let expected = "\
+----------+--------+------+
|  Field   |  Type  | Null |
+----------+--------+------+
| parentID | INT    | true |
| name     | STRING | true |
| id       | INT    | true |
+----------+--------+------+
";
    assert_eq!(output, expected);
}

#[tokio::test]
async fn test_placeholder_query_table() {
    let mut conn = system_namespace();
    let output = run(
        &mut conn,
        "SELECT * FROM system.namespace WHERE name=$1",
        vec!["descriptor".into()],
    )
    .await;

    let expected = "\
+----------+------------+----+
| parentID |    name    | id |
+----------+------------+----+
| 1        | descriptor | 3  |
+----------+------------+----+
";
    assert_eq!(output, expected);
    assert_eq!(
        conn.received()[0].params(),
        &[Value::String("descriptor".to_string())]
    );
}

#[tokio::test]
async fn test_empty_result_prints_header_only() {
    let mut conn = system_namespace();
    let output = run(&mut conn, "SELECT * FROM system.namespace WHERE false", vec![]).await;

    let expected = "\
+----------+------+----+
| parentID | name | id |
+----------+------+----+
+----------+------+----+
";
    assert_eq!(output, expected);
}

#[tokio::test]
async fn test_consecutive_statements_share_sink() {
    let mut conn = system_namespace();
    let mut sink = OutputSink::new(Vec::new());

    run_query(&mut conn, &mut sink, "SET DATABASE=system", vec![])
        .await
        .unwrap();
    run_query(&mut conn, &mut sink, "SET DATABASE=system", vec![])
        .await
        .unwrap();

    assert_eq!(sink.into_inner(), b"OK\nOK\n".to_vec());
    assert_eq!(conn.open_cursors(), 0);
}

#[tokio::test]
async fn test_failed_statement_prints_nothing() {
    let mut conn = MockConnection::new().with_failing_rows(
        "SELECT * FROM big",
        &["id"],
        vec![vec![Value::Int(1)], vec![Value::Int(2)]],
        1,
    );
    let mut sink = OutputSink::new(Vec::new());

    let err = run_query(&mut conn, &mut sink, "SELECT * FROM big", vec![])
        .await
        .unwrap_err();

    assert!(matches!(err, ShellError::Query(_)));
    assert!(sink.into_inner().is_empty());
    assert_eq!(conn.open_cursors(), 0);
}
