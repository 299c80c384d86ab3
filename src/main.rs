//! sql-shell - execute SQL statements and print aligned result tables.

use sql_shell::cli::{read_statements, Cli};
use sql_shell::config::Config;
use sql_shell::db::PostgresConnection;
use sql_shell::error::{Result, ShellError};
use sql_shell::logging;
use sql_shell::output::OutputSink;
use sql_shell::query::run_query;
use tracing::info;

#[tokio::main]
async fn main() {
    logging::init_stderr_logging();

    if let Err(e) = run().await {
        eprintln!("{}: {}", e.category(), e.message());
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let mut connection = cli.resolve_connection(&config)?.ok_or_else(|| {
        ShellError::config("No database connection configured. Use --help for usage information.")
    })?;
    connection.apply_env_defaults();
    info!("Connection: {}", connection.display_string());

    let statements = if cli.execute.is_empty() {
        read_statements(std::io::stdin().lock())?
    } else {
        cli.execute.clone()
    };
    let params = cli.params();

    let mut conn = PostgresConnection::connect(&connection).await?;
    let mut sink = OutputSink::stdout();

    let mut result = Ok(());
    for sql in &statements {
        result = run_query(&mut conn, &mut sink, sql, params.clone()).await;
        if result.is_err() {
            break;
        }
    }

    // Close even after a failed statement; the statement error wins.
    let closed = conn.close().await;
    result.and(closed)
}
