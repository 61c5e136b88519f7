//! Binary entrypoint for the BerlinMUD CLI.
//!
//! Commands:
//! - `start [--bind <addr>]` - load the levels and serve players over TCP
//! - `init` - write a starter `config.toml`
//! - `check` - load the levels and report problems without serving
//!
//! See the library crate docs for module-level details: `berlinmud::`.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::sync::Arc;

use berlinmud::config::Config;
use berlinmud::game::{load_world, GameStore};
use berlinmud::server::MudServer;

#[derive(Parser)]
#[command(name = "berlinmud")]
#[command(about = "A multi-user text adventure server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the game server
    Start {
        /// Listen address, overriding `[server].bind`
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Write a default configuration file
    Init,
    /// Load the levels and report the default room and dangling exits
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Start { bind } => {
            info!("Starting BerlinMUD v{}", env!("CARGO_PKG_VERSION"));
            let mut config = match pre_config {
                Some(config) => config,
                None => {
                    warn!("No usable config at {}; using defaults", cli.config);
                    Config::default()
                }
            };
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            let world = load_world(config.storage.levels_path()).with_context(|| {
                format!(
                    "failed to load levels from {}",
                    config.storage.levels_path().display()
                )
            })?;
            info!(
                "{} rooms loaded, players start in {}",
                world.len(),
                world.default_key()
            );
            let store = GameStore::open(config.storage.players_path()).with_context(|| {
                format!(
                    "failed to open player store {}",
                    config.storage.players_path().display()
                )
            })?;
            let server = Arc::new(MudServer::new(config, world, store));
            server.run().await?;
        }
        Commands::Init => {
            info!("Initializing new configuration");
            Config::create_default(&cli.config).await?;
            let cfg = Config::default();
            tokio::fs::create_dir_all(cfg.storage.levels_path()).await?;
            info!("Configuration file created at {}", cli.config);
            info!(
                "Put level files (*.json) into {}",
                cfg.storage.levels_path().display()
            );
        }
        Commands::Check => {
            let config = pre_config.unwrap_or_default();
            let levels = config.storage.levels_path();
            let world = load_world(&levels)
                .with_context(|| format!("failed to load levels from {}", levels.display()))?;
            println!("Levels:       {}", levels.display());
            println!("Rooms:        {}", world.len());
            println!("Default room: {}", world.default_key());
            let dangling = world.dangling_exits();
            if dangling.is_empty() {
                println!("Dangling exits: none");
            } else {
                println!("Dangling exits: {}", dangling.len());
                for exit in dangling {
                    warn!(
                        "{}: direction '{}' leads to unknown room '{}'",
                        exit.from, exit.direction, exit.target
                    );
                    println!("  {} --{}--> {}", exit.from, exit.direction, exit.target);
                }
            }
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|cfg| cfg.logging.level.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // foreground runs echo to the console as well
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
