//! `vinyl-server` -- the MechMania IV authoritative game server.
//!
//! Binds a TCP port, waits for the teams and the observer, and drives
//! the turn loop until game time runs out. No environment variables are
//! required; `RUST_LOG` tunes log verbosity.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vinyl_server::server::Server;
use vinyl_sim::config::GameConfig;

/// MechMania IV: The Vinyl Frontier -- game server.
#[derive(Debug, Parser)]
#[command(name = "vinyl-server", version, about)]
struct Args {
    /// TCP port to listen on.
    #[arg(long, default_value_t = 2323)]
    port: u16,

    /// Number of competing teams (the observer connects besides).
    #[arg(long = "numteams", default_value_t = 2)]
    num_teams: usize,

    /// Seed for the world's RNG (asteroid drift and ID cookies).
    #[arg(long, default_value_t = 0x4D4D_3443)]
    seed: u64,

    /// Optional JSON file overriding the default game constants.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Optional JSONL journal of per-turn state hashes and scores.
    #[arg(long)]
    journal: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<GameConfig>(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    config.validate().context("validating config")?;

    let mut server = Server::new(
        config,
        args.num_teams,
        args.port,
        args.seed,
        args.journal.as_deref(),
    )
    .context("starting server")?;

    server.run().context("running the game")?;

    info!("game complete");
    for t in 0..args.num_teams {
        println!(
            "{}: {:.2} vinyl",
            server.world().teams[t].name,
            server.world().team_score(t)
        );
    }
    Ok(())
}
