//! Arena CLI: play one deck against another many times and report balance numbers.
//!
//! Usage:
//!   cargo run --release --bin arena -- --player decks/water.json --enemy decks/fire.json --games 500
//!   cargo run --release --bin arena -- --player a.json --enemy b.json --strategy random,greedy

use std::path::{Path, PathBuf};

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use duel_progression::config::resolve_balance;
use duel_progression::engine::arena::run_arena;
use duel_progression::engine::models::Card;
use duel_progression::engine::normalize::normalize_deck;
use duel_progression::engine::strategy::{strategy_by_name, STRATEGY_NAMES};

#[derive(Parser)]
#[command(name = "arena", about = "Run seeded deck-vs-deck duel batches")]
struct Cli {
    /// Player deck (JSON array of card records)
    #[arg(long)]
    player: PathBuf,

    /// Enemy deck (JSON array of card records)
    #[arg(long)]
    enemy: PathBuf,

    /// Number of games per strategy
    #[arg(long, default_value = "100")]
    games: usize,

    /// Base random seed; game i uses seed + i
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Comma-separated slot strategies for the player side
    #[arg(long, default_value = "greedy", value_delimiter = ',')]
    strategy: Vec<String>,

    /// Path to balance.toml (default: auto-discover)
    #[arg(long, env = "DUEL_BALANCE")]
    balance: Option<PathBuf>,
}

fn load_deck(path: &Path, prefix: &str) -> Vec<Card> {
    let raw: Vec<Value> = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
        .unwrap_or_else(|e| {
            eprintln!("Error loading deck {}: {}", path.display(), e);
            std::process::exit(1);
        });
    normalize_deck(&raw, prefix)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let rules = resolve_balance(cli.balance.as_deref()).unwrap_or_else(|e| {
        eprintln!("Error loading balance: {}", e);
        std::process::exit(1);
    });

    let player = load_deck(&cli.player, "p");
    let enemy = load_deck(&cli.enemy, "e");

    eprintln!(
        "Arena: {} games, seed={}, player={} cards, enemy={} cards",
        cli.games,
        cli.seed,
        player.len(),
        enemy.len()
    );

    for name in &cli.strategy {
        let Some(strategy) = strategy_by_name(name.trim()) else {
            eprintln!("Unknown strategy '{}' (expected one of {:?})", name, STRATEGY_NAMES);
            std::process::exit(1);
        };

        match run_arena(&player, &enemy, strategy.as_ref(), cli.games, cli.seed, rules.duel.max_turns) {
            Ok(result) => println!("{}", result.summary()),
            Err(e) => {
                eprintln!("Arena failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}
