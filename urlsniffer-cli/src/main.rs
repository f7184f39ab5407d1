//! urlsniffer CLI
//!
//! Tracks URLs seen in honeypot traffic and whether they are still live.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncReadExt, BufReader};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use urlsniffer_core::{deobfuscate, extract_urls};
use urlsniffer_net::{ProbeConfig, TcpProbe};
use urlsniffer_runtime::{pump, SnifferConfig, UrlSniffer};
use urlsniffer_store::StoreConfig;

#[derive(Parser)]
#[command(name = "urlsniffer")]
#[command(author, version, about = "urlsniffer: honeypot URL extraction and liveness tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Read JSON-lines honeypot events from stdin and track their URLs
    Run {
        /// TOML configuration file
        #[arg(short, long, env = "URLSNIFFER_CONFIG")]
        config: Option<PathBuf>,

        /// Seconds between re-verification sweeps (overrides the config file)
        #[arg(long)]
        verify_interval: Option<u64>,

        /// Use a SQLite database file as the store (overrides the config file)
        #[arg(long)]
        sqlite: Option<PathBuf>,
    },

    /// Print the URLs found in TEXT (or stdin)
    Extract {
        text: Option<String>,
    },

    /// Print TEXT (or stdin) after deobfuscation
    Deobfuscate {
        text: Option<String>,
    },

    /// Check whether a URL's host accepts TCP connections
    Probe {
        url: String,

        /// Connect timeout in seconds
        #[arg(long, default_value = "5")]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match cli.command {
        Commands::Run {
            config,
            verify_interval,
            sqlite,
        } => {
            let mut config = match config {
                Some(path) => SnifferConfig::from_file(path)?,
                None => SnifferConfig::default(),
            };
            if let Some(secs) = verify_interval {
                config.verify_interval = secs;
            }
            if let Some(path) = sqlite {
                config.store = StoreConfig::Sqlite { path };
            }
            run(config).await?;
        }
        Commands::Extract { text } => {
            let text = text_or_stdin(text).await?;
            let mut urls: Vec<_> = extract_urls(&text).into_iter().collect();
            urls.sort();
            for url in urls {
                println!("{}", url);
            }
        }
        Commands::Deobfuscate { text } => {
            let text = text_or_stdin(text).await?;
            println!("{}", deobfuscate(&text));
        }
        Commands::Probe { url, timeout } => {
            let probe = TcpProbe::new(ProbeConfig { timeout_secs: timeout });
            match probe.connect(&url).await {
                Ok(target) => println!("live\t{}:{}", target.host, target.port),
                Err(e) => println!("dead\t{}", e),
            }
        }
    }

    Ok(())
}

async fn run(config: SnifferConfig) -> Result<()> {
    info!(
        "Starting with {:?} store, verifying every {}s",
        config.store, config.verify_interval
    );
    let sniffer = UrlSniffer::start(&config).await?;

    let fed = tokio::select! {
        result = pump(&sniffer, BufReader::new(tokio::io::stdin())) => Some(result),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            None
        }
    };

    // the store is closed however the feed ended
    sniffer.stop().await;

    if let Some(result) = fed {
        let handled = result.context("reading events from stdin")?;
        info!("Handled {} events", handled);
    }
    Ok(())
}

async fn text_or_stdin(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}
