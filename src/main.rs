//! ttlkv - An In-Memory Key-Value Store with TTL
//!
//! This is the console front end. It builds a store on the system clock,
//! starts the background reclaimer, and executes commands read from stdin
//! line by line, printing each reply to stdout.

use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use ttlkv::storage::{shared, ExpiryReclaimer, KvStorage, ReclaimConfig};
use ttlkv::{Command, CommandHandler, ConfigError, Reply, SystemClock};

/// Console configuration
#[derive(Debug, Default)]
struct Config {
    /// Background reclaimer settings
    reclaim: ReclaimConfig,
}

/// What the command line asked for
enum Invocation {
    Run(Config),
    Help,
    Version,
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args<I>(args: I) -> Result<Invocation, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--reclaim-interval-ms" | "-i" => {
                    let ms: u64 = parse_value(&arg, args.next())?;
                    let interval = Duration::from_millis(ms);
                    config.reclaim.base_interval = interval;
                    config.reclaim.min_interval = config.reclaim.min_interval.min(interval);
                    config.reclaim.max_interval = config.reclaim.max_interval.max(interval);
                }
                "--reclaim-batch" | "-b" => {
                    config.reclaim.max_per_sweep = parse_value(&arg, args.next())?;
                }
                "--help" | "-h" => return Ok(Invocation::Help),
                "--version" | "-v" => return Ok(Invocation::Version),
                _ => return Err(ConfigError::UnknownArgument(arg)),
            }
        }

        config.reclaim.validate()?;
        Ok(Invocation::Run(config))
    }
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T, ConfigError> {
    let value = value.ok_or_else(|| ConfigError::MissingValue(flag.to_string()))?;
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        flag: flag.to_string(),
        value,
    })
}

fn print_help() {
    println!(
        r#"
ttlkv - An In-Memory Key-Value Store with TTL

USAGE:
    ttlkv [OPTIONS]

OPTIONS:
    -i, --reclaim-interval-ms <MS>   Base interval between reclaim sweeps (default: 100)
    -b, --reclaim-batch <N>          Most entries reclaimed per sweep (default: 128)
    -v, --version                    Print version information
    -h, --help                       Print this help message

COMMANDS (one per line on stdin):
    SET key value [ttl]    Set a key; ttl in seconds, 0 = never expires
    GET key                Get a key
    DEL key [key ...]      Delete keys
    RANGE start count      List live keys sorted after `start`
    RECLAIM [max]          Evict expired entries now
    TTL key                Seconds left (-1 persistent, -2 missing)
    DBSIZE | INFO | PING | QUIT

    Values containing spaces can be double-quoted: SET k "hello world" 60
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_args(std::env::args().skip(1))? {
        Invocation::Run(config) => config,
        Invocation::Help => {
            print_help();
            return Ok(());
        }
        Invocation::Version => {
            println!("ttlkv version {}", ttlkv::VERSION);
            return Ok(());
        }
    };

    // Set up logging; stdout is reserved for replies
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    info!("ttlkv v{} starting", ttlkv::VERSION);

    let storage = shared(KvStorage::new(SystemClock::new()));
    let _reclaimer = ExpiryReclaimer::start(Arc::clone(&storage), config.reclaim)?;
    let handler = CommandHandler::new(storage);

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    tokio::select! {
        result = console_loop(handler) => result?,
        _ = shutdown => {}
    }

    info!("ttlkv shutdown complete");
    Ok(())
}

/// Reads commands from stdin until EOF or QUIT.
async fn console_loop(handler: CommandHandler<SystemClock>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = match Command::parse(line) {
            Ok(Command::Quit) => {
                stdout.write_all(b"OK\n").await?;
                stdout.flush().await?;
                break;
            }
            Ok(command) => handler.execute(command),
            Err(err) => {
                debug!(%err, "Rejected command");
                Reply::from(err)
            }
        };

        stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
        stdout.flush().await?;
    }

    debug!("Console input closed");
    Ok(())
}
