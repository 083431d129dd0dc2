//! `sqlbench` command line tool
//!
//! Runs the benchmark against a PostgreSQL server for a number of iterations and prints a
//! summary line for each.
use anyhow::Context;
use clap::Parser;
use sqlbench::core::{
    group_thousands, BenchmarkReport, DEFAULT_ITERATIONS, DEFAULT_QUERIES_PER_USER,
    DEFAULT_QUERY, DEFAULT_USER_COUNT,
};
use sqlbench::prelude::*;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(version, about = "Concurrent query throughput benchmark for PostgreSQL")]
struct Cli {
    /// Connection string (`host=... user=...`) or `postgres://` URL
    #[arg(short, long)]
    connection: String,

    /// Query to execute for each user. Optionally a file to read the query from
    #[arg(short, long, default_value = DEFAULT_QUERY)]
    query: String,

    /// How many users to simulate
    #[arg(short, long, default_value_t = DEFAULT_USER_COUNT)]
    users: usize,

    /// How many queries to execute per user
    #[arg(short = 'n', long, default_value_t = DEFAULT_QUERIES_PER_USER)]
    queries: usize,

    /// Number of benchmark iterations to run
    #[arg(short, long, default_value_t = DEFAULT_ITERATIONS)]
    iterations: usize,

    /// Per-query timeout in seconds
    #[arg(short, long, default_value_t = 30)]
    timeout: u64,

    /// Use verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Do not verify or create the benchmark table
    #[arg(long)]
    skip_fixture: bool,

    /// Do not print a throughput sample every second
    #[arg(long)]
    no_sampling: bool,

    /// Do not write the CSV sample record
    #[arg(long)]
    no_report: bool,

    /// Directory to write the CSV sample record into
    #[arg(long, default_value = ".")]
    report_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli).await
}

/// Fatal errors are left to the caller to report.
async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("Starting Up");
    let template = QueryTemplate::load(&cli.query)
        .with_context(|| format!("Unable to read query file {}", cli.query))?;

    let config = BenchmarkConfig::new(template.text())
        .users(cli.users)
        .queries_per_user(cli.queries)
        .skip_fixture(cli.skip_fixture)
        .live_sampling(!cli.no_sampling)
        .write_report(!cli.no_report)
        .report_dir(cli.report_dir);
    let connector =
        PostgresConnector::new(&cli.connection).timeout(Duration::from_secs(cli.timeout));

    let iterations = cli.iterations;
    let benchmark = Benchmark::new(connector, config);
    benchmark
        .run_iterations(iterations, |iteration, report| {
            info!("{}", report_line(iteration, iterations, report));
        })
        .await
        .context("Benchmark aborted")?;

    info!("Finished Benchmarking");
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "sqlbench=debug,sqlbench_cli=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(verbose)
        .init();
}

fn report_line(iteration: usize, iterations: usize, report: &BenchmarkReport) -> String {
    format!(
        "[{}/{}] Benchmark Completed [Runtime: {}ms | Average queries/sec: {} | Users: {} | Per-user Queries: {}]",
        iteration,
        iterations,
        group_thousands(report.total_query_runtime.as_millis() as u64),
        group_thousands(report.average_queries_per_second.round() as u64),
        group_thousands(report.user_count as u64),
        group_thousands(report.queries_per_user as u64),
    )
}
