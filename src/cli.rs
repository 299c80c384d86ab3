//! Command-line argument parsing for sql-shell.
//!
//! Uses clap to parse connection options and the statements to run.

use crate::config::{Config, ConnectionConfig, DEFAULT_PORT};
use crate::db::Value;
use crate::error::{Result, ShellError};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;

/// Execute SQL statements and print the results as aligned tables.
#[derive(Parser, Debug)]
#[command(name = "sql-shell")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Connection URL (e.g., postgresql://root@localhost:26257/system?sslmode=disable)
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Database host
    #[arg(short = 'H', long, value_name = "HOST")]
    pub host: Option<String>,

    /// Database port
    #[arg(short = 'p', long, value_name = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Database name
    #[arg(short = 'd', long, value_name = "DATABASE")]
    pub database: Option<String>,

    /// Database user
    #[arg(short = 'U', long, value_name = "USER")]
    pub user: Option<String>,

    /// Use named connection from config
    #[arg(short = 'c', long, value_name = "NAME")]
    pub connection: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Statement to execute (repeatable); statements are read from stdin when omitted
    #[arg(short = 'e', long = "execute", value_name = "SQL")]
    pub execute: Vec<String>,

    /// Positional parameter bound to $1, $2, ... in order (repeatable)
    #[arg(short = 'a', long = "arg", value_name = "VALUE")]
    pub args: Vec<String>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Converts CLI arguments to a ConnectionConfig.
    ///
    /// This creates a config from CLI args only, without merging with file config.
    pub fn to_connection_config(&self) -> Result<Option<ConnectionConfig>> {
        if let Some(url) = &self.url {
            return Ok(Some(ConnectionConfig::from_connection_string(url)?));
        }

        if self.host.is_some() || self.database.is_some() || self.user.is_some() {
            return Ok(Some(ConnectionConfig {
                host: self.host.clone(),
                port: self.port,
                database: self.database.clone(),
                user: self.user.clone(),
                ..Default::default()
            }));
        }

        Ok(None)
    }

    /// Resolves the connection from the config file with CLI arguments on top.
    ///
    /// The named entry (`-c`) or else the `default` entry is the base; a URL or
    /// connection flags override the fields they set.
    pub fn resolve_connection(&self, config: &Config) -> Result<Option<ConnectionConfig>> {
        let base = match self.connection_name() {
            Some(name) => Some(config.get_connection(Some(name)).cloned().ok_or_else(|| {
                ShellError::config(format!("Connection '{}' not found in config file", name))
            })?),
            None => config.get_connection(None).cloned(),
        };

        Ok(match (base, self.to_connection_config()?) {
            (Some(mut base), Some(overrides)) => {
                base.merge(&overrides);
                Some(base)
            }
            (base, overrides) => overrides.or(base),
        })
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }

    /// Returns the named connection to use, if specified.
    pub fn connection_name(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    /// Positional parameters as statement values.
    pub fn params(&self) -> Vec<Value> {
        self.args.iter().map(|a| Value::from(a.as_str())).collect()
    }
}

/// Reads statements one per line, skipping blank lines and dropping a trailing `;`.
pub fn read_statements(reader: impl BufRead) -> Result<Vec<String>> {
    let mut statements = Vec::new();
    for line in reader.lines() {
        let line =
            line.map_err(|e| ShellError::internal(format!("Failed to read statements: {e}")))?;
        let sql = line.trim().trim_end_matches(';').trim_end();
        if !sql.is_empty() {
            statements.push(sql.to_string());
        }
    }
    Ok(statements)
}
