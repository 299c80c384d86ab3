//! PostgreSQL-wire connection implementation.
//!
//! Provides `PostgresConnection`, which implements the `Connection` trait over a
//! single sqlx `PgConnection`. CockroachDB speaks the same protocol.

use crate::config::ConnectionConfig;
use crate::db::{Connection, Cursor, Row, Statement, Value};
use crate::error::{Result, ShellError};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use sqlx::postgres::{PgArguments, PgConnection, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::{
    Column as SqlxColumn, Connection as _, Either, Executor, Row as SqlxRow,
    Statement as SqlxStatement, TypeInfo, ValueRef,
};
use tracing::debug;

/// A single open connection to a PostgreSQL-wire server.
#[derive(Debug)]
pub struct PostgresConnection {
    conn: PgConnection,
}

impl PostgresConnection {
    /// Opens a connection using the given configuration.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;

        let conn = PgConnection::connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Connected to {}", config.display_string());
        Ok(Self { conn })
    }

    /// Closes the connection, sending a termination message to the server.
    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| ShellError::connection(e.to_string()))
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn query<'a>(&'a mut self, statement: &'a Statement) -> Result<Box<dyn Cursor + 'a>> {
        // Describing first tells a relation with zero rows apart from a statement
        // that returns no relation at all.
        let described = (&mut self.conn)
            .prepare(statement.sql())
            .await
            .map_err(|e| ShellError::query(format_query_error(e)))?;

        let columns: Vec<String> = described
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();
        let columns = if columns.is_empty() {
            None
        } else {
            Some(columns)
        };

        // The cached statement keeps the server-inferred parameter types, so each
        // value must be encoded as exactly that type.
        let param_types: Option<Vec<String>> = match described.parameters() {
            Some(Either::Left(types)) => Some(types.iter().map(|t| t.name().to_string()).collect()),
            _ => None,
        };
        let params = coerce_params(statement.params(), param_types.as_deref())?;

        let query = params
            .into_iter()
            .fold(sqlx::query(statement.sql()), bind_param);

        Ok(Box::new(PostgresCursor {
            columns,
            rows: query.fetch(&mut self.conn),
        }))
    }
}

/// Streams rows of one statement; dropping it releases the portal.
struct PostgresCursor<'a> {
    columns: Option<Vec<String>>,
    rows: BoxStream<'a, std::result::Result<PgRow, sqlx::Error>>,
}

#[async_trait]
impl<'a> Cursor for PostgresCursor<'a> {
    fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    async fn next_row(&mut self) -> Result<Option<Row>> {
        let row = self
            .rows
            .try_next()
            .await
            .map_err(|e| ShellError::query(format_query_error(e)))?;

        Ok(row.as_ref().map(convert_row))
    }
}

/// A parameter encoded as the type the server described for its placeholder.
#[derive(Debug, Clone, PartialEq)]
enum PgParam {
    Null,
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Text(String),
    Bytes(Vec<u8>),
}

/// Converts statement values to the described parameter types.
///
/// Without a description each value keeps its natural encoding.
fn coerce_params(values: &[Value], types: Option<&[String]>) -> Result<Vec<PgParam>> {
    let Some(types) = types else {
        return Ok(values.iter().map(natural_param).collect());
    };

    if types.len() != values.len() {
        return Err(ShellError::query(format!(
            "statement expects {} parameter(s), got {}",
            types.len(),
            values.len()
        )));
    }

    values
        .iter()
        .zip(types)
        .enumerate()
        .map(|(i, (value, type_name))| coerce_param(value, type_name, i + 1))
        .collect()
}

fn natural_param(value: &Value) -> PgParam {
    match value {
        Value::Null => PgParam::Null,
        Value::Bool(b) => PgParam::Bool(*b),
        Value::Int(i) => PgParam::Int8(*i),
        Value::Float(f) => PgParam::Float8(*f),
        Value::String(s) => PgParam::Text(s.clone()),
        Value::Bytes(b) => PgParam::Bytes(b.clone()),
    }
}

/// Converts one value for placeholder `$position` of type `type_name`.
fn coerce_param(value: &Value, type_name: &str, position: usize) -> Result<PgParam> {
    if value.is_null() {
        return Ok(PgParam::Null);
    }

    let mismatch = || {
        ShellError::query(format!(
            "parameter ${position}: cannot use {} as {}",
            value.to_display_string(),
            type_name.to_lowercase()
        ))
    };

    let param = match (type_name, value) {
        ("BOOL", Value::Bool(b)) => PgParam::Bool(*b),
        ("BOOL", Value::String(s)) => PgParam::Bool(parse_bool(s).ok_or_else(mismatch)?),

        ("INT2" | "INT4" | "INT8", Value::Int(i)) => narrow_int(*i, type_name).ok_or_else(mismatch)?,
        ("INT2" | "INT4" | "INT8", Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|i| narrow_int(i, type_name))
            .ok_or_else(mismatch)?,

        ("FLOAT4", Value::Float(f)) => PgParam::Float4(*f as f32),
        ("FLOAT4", Value::Int(i)) => PgParam::Float4(*i as f32),
        ("FLOAT4", Value::String(s)) => {
            PgParam::Float4(s.trim().parse().map_err(|_| mismatch())?)
        }
        ("FLOAT8", Value::Float(f)) => PgParam::Float8(*f),
        ("FLOAT8", Value::Int(i)) => PgParam::Float8(*i as f64),
        ("FLOAT8", Value::String(s)) => {
            PgParam::Float8(s.trim().parse().map_err(|_| mismatch())?)
        }

        ("BYTEA", Value::Bytes(b)) => PgParam::Bytes(b.clone()),
        ("BYTEA", Value::String(s)) => PgParam::Bytes(s.as_bytes().to_vec()),

        ("TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "UNKNOWN", Value::Bytes(_)) => {
            return Err(mismatch())
        }
        ("TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "UNKNOWN", other) => {
            PgParam::Text(other.to_display_string())
        }

        _ => return Err(mismatch()),
    };

    Ok(param)
}

/// Narrows an integer to the width of the described integer type.
fn narrow_int(value: i64, type_name: &str) -> Option<PgParam> {
    match type_name {
        "INT2" => i16::try_from(value).ok().map(PgParam::Int2),
        "INT4" => i32::try_from(value).ok().map(PgParam::Int4),
        _ => Some(PgParam::Int8(value)),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "t" | "yes" | "on" | "1" => Some(true),
        "false" | "f" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Binds one positional parameter.
fn bind_param(
    query: Query<'_, Postgres, PgArguments>,
    param: PgParam,
) -> Query<'_, Postgres, PgArguments> {
    match param {
        PgParam::Null => query.bind(None::<String>),
        PgParam::Bool(b) => query.bind(b),
        PgParam::Int2(i) => query.bind(i),
        PgParam::Int4(i) => query.bind(i),
        PgParam::Int8(i) => query.bind(i),
        PgParam::Float4(f) => query.bind(f),
        PgParam::Float8(f) => query.bind(f),
        PgParam::Text(s) => query.bind(s),
        PgParam::Bytes(b) => query.bind(b),
    }
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    let is_null = row
        .try_get_raw(index)
        .map(|raw| raw.is_null())
        .unwrap_or(true);
    if is_null {
        return Value::Null;
    }

    let decoded = match type_name {
        "BOOL" => row.try_get::<bool, _>(index).map(Value::Bool),
        "INT2" => row.try_get::<i16, _>(index).map(|v| Value::Int(v as i64)),
        "INT4" => row.try_get::<i32, _>(index).map(|v| Value::Int(v as i64)),
        "INT8" => row.try_get::<i64, _>(index).map(Value::Int),
        "FLOAT4" => row.try_get::<f32, _>(index).map(|v| Value::Float(v as f64)),
        "FLOAT8" => row.try_get::<f64, _>(index).map(Value::Float),
        "BYTEA" => row.try_get::<Vec<u8>, _>(index).map(Value::Bytes),
        _ => row.try_get::<String, _>(index).map(Value::String),
    };

    // Types without a text decoding still get a visible placeholder.
    decoded.unwrap_or_else(|_| Value::String(format!("<{}>", type_name.to_lowercase())))
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> ShellError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.port;
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        ShellError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        ShellError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        ShellError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        ShellError::connection(
            "Server requires SSL. Add '?sslmode=require' to the connection string.".to_string(),
        )
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        ShellError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        ShellError::connection(error.to_string())
    }
}

/// Formats a statement error, keeping the server's detail and hint lines.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }

        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }

        if let Some(constraint) = pg_error.constraint() {
            result.push_str("\n  CONSTRAINT: ");
            result.push_str(constraint);
        }
    }

    result
}
