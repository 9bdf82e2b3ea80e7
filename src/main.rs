//! Binary entrypoint for the Questbot CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml` and an empty player file
//! - `play --player <id>` - play from the terminal, one command per line
//! - `status` - print the player count and a one-line summary per character
//!
//! See the library crate docs for module-level details: `questbot::`.
use std::io::BufRead;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::sync::mpsc;

use questbot::config::Config;
use questbot::game::{start_store, CommandProcessor, GameService, RecordStore};

#[derive(Parser)]
#[command(name = "questbot")]
#[command(about = "A chat RPG combat and loot engine")]
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
    /// Write a default configuration and create the player file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
    /// Play interactively as the given player id
    Play {
        #[arg(short, long)]
        player: String,
    },
    /// Show stored characters
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => {
            init_logging(&None, cli.verbose);
            if !force && tokio::fs::try_exists(&cli.config).await.unwrap_or(false) {
                warn!("{} already exists; pass --force to overwrite", cli.config);
            } else {
                Config::create_default(&cli.config).await?;
                info!("Configuration file created at {}", cli.config);
            }
            let config = Config::load(&cli.config).await?;
            let store = RecordStore::open(config.storage.players_path())?;
            store.save(&store.load())?;
            info!("Player file ready at {}", store.path().display());
        }
        Commands::Play { player } => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            info!("Starting Questbot v{}", env!("CARGO_PKG_VERSION"));
            play(config, player).await?;
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            let store = RecordStore::open(config.storage.players_path())?;
            let db = store.load();
            println!("Player file: {}", store.path().display());
            println!("Characters: {}", db.players.len());
            for (id, p) in &db.players {
                println!(
                    "  {} ({}) health {}/{} currency {} items {} party {}",
                    id,
                    p.display_name(),
                    p.health,
                    p.max_health,
                    p.currency,
                    p.inventory.len(),
                    p.party.len()
                );
            }
        }
    }

    Ok(())
}

async fn play(config: Config, player: String) -> Result<()> {
    let store = start_store(RecordStore::open(config.storage.players_path())?);
    let service = GameService::new(store.clone(), config.game.clone());

    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel::<String>();
    let printer = tokio::spawn(async move {
        while let Some(line) = outbox_rx.recv().await {
            println!("{}", line);
        }
    });

    // Dedicated thread so a pending stdin read never holds up runtime shutdown
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if input_tx.send(line).is_err() {
                break;
            }
        }
    });

    let processor = CommandProcessor::new(service, outbox_tx.clone());
    let _ = outbox_tx.send(format!(
        "Playing as {}. Type /help for commands, /quit to leave.",
        player
    ));
    while let Some(line) = input_rx.recv().await {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("/quit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }
        processor.handle(&player, &line, &mut input_rx).await;
    }

    drop(processor);
    drop(outbox_tx);
    let _ = printer.await;
    store.shutdown().await;
    info!("Session for {} ended", player);
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match (verbosity, config) {
        (0, Some(cfg)) => cfg.logging.level_filter(),
        (0, None) => log::LevelFilter::Info,
        (1, _) => log::LevelFilter::Debug,
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

    match log_file {
        Some(f) => {
            let file = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Mirror to the console only when attached to a terminal
            let is_tty = atty::is(atty::Stream::Stderr);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = file.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
