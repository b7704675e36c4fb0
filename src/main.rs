//! CLI entry point for the session client.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use session_client::{
    ClientConfig, FileCache, FormValue, KeyValueCache, RequestOptions, SessionClient,
    default_cache_dir,
};
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(url = %args.url, login_url = %args.login_url, "CLI arguments parsed");

    let mut config = match &args.config {
        Some(path) => ClientConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(max_retries) = args.max_retries {
        config.max_retry_count = max_retries;
    }
    if let Some(interval_ms) = args.interval_ms {
        config.least_interval_millis = interval_ms;
    }

    let cache_dir = match &args.cache_dir {
        Some(dir) => dir.clone(),
        None => default_cache_dir().context("failed to locate session cache directory")?,
    };
    debug!(cache_dir = %cache_dir.display(), "using session cache");
    let cache: Arc<dyn KeyValueCache> = Arc::new(FileCache::new(cache_dir));

    let mut client = SessionClient::builder(&args.login_url)
        .credentials(
            args.fields
                .iter()
                .map(|(name, value)| (name.clone(), FormValue::from(value.as_str()))),
        )
        .config(config)
        .cache(cache)
        .build()
        .context("failed to create session client")?;

    let response = client
        .fetch_with(&args.url, RequestOptions::new(), !args.no_login)
        .await
        .with_context(|| format!("failed to fetch {}", args.url))?;

    info!(status = response.status, bytes = response.body.len(), "fetch complete");

    let mut stdout = io::stdout().lock();
    if args.include_headers {
        writeln!(stdout, "HTTP {}", response.status)?;
        for (name, value) in &response.headers {
            writeln!(stdout, "{name}: {value}")?;
        }
        writeln!(stdout)?;
    }
    stdout.write_all(&response.body)?;
    stdout.flush()?;

    Ok(())
}
