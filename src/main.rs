use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use duel_progression::config::resolve_balance;
use duel_progression::engine::duel::Duel;
use duel_progression::engine::models::DuelOutcome;
use duel_progression::engine::normalize::normalize_deck;
use duel_progression::engine::simulator::simulate_duel;
use duel_progression::engine::strategy::{strategy_by_name, STRATEGY_NAMES};
use duel_progression::progression::{
    Account, BattlePayload, BonusPatch, FileStore, ProgressionService, SystemClock, Title,
};

#[derive(Parser)]
#[command(name = "duel-progression", about = "Apply duel results to a player account")]
struct Cli {
    /// Account JSON file
    #[arg(long, default_value = "account.json", env = "DUEL_ACCOUNT")]
    account: PathBuf,

    /// Path to balance.toml (default: auto-discover)
    #[arg(long, env = "DUEL_BALANCE")]
    balance: Option<PathBuf>,

    /// Random seed for gold, shuffles and arena swings
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the account file if it does not exist
    Init {
        #[arg(long, default_value = "player")]
        name: String,
    },
    /// Print the progression snapshot
    State,
    /// Apply a battle payload read from a JSON file
    Apply { payload: PathBuf },
    /// Play a duel between two JSON decks, then apply the result
    Duel {
        player: PathBuf,
        enemy: PathBuf,
        #[arg(long, default_value = "greedy")]
        strategy: String,
        #[arg(long, default_value = "enemy")]
        enemy_name: String,
    },
    /// Grant XP outside of a duel
    GrantXp { amount: u64 },
    /// Set named bonus percentages; omitted fields are kept
    Bonuses {
        #[arg(long)]
        xp_daily: Option<u32>,
        #[arg(long)]
        xp_potion: Option<u32>,
        #[arg(long)]
        xp_guild_arena: Option<u32>,
        #[arg(long)]
        xp_event: Option<u32>,
        #[arg(long)]
        silver_daily: Option<u32>,
        #[arg(long)]
        silver_potion: Option<u32>,
        #[arg(long)]
        silver_guild_arena: Option<u32>,
        #[arg(long)]
        silver_event: Option<u32>,
    },
    GuildLevel { level: u32 },
    Title {
        title: TitleArg,
        /// Remove the title instead of granting it
        #[arg(long)]
        off: bool,
    },
    /// Move the account to a duel league by id
    League { id: String },
    /// Apply an arena result
    Arena { result: DuelOutcome },
}

#[derive(Clone, Copy, ValueEnum)]
enum TitleArg {
    TournamentChampion,
    DuelChampion,
    AbsoluteChampion,
}

impl From<TitleArg> for Title {
    fn from(t: TitleArg) -> Self {
        match t {
            TitleArg::TournamentChampion => Title::TournamentChampion,
            TitleArg::DuelChampion => Title::DuelChampion,
            TitleArg::AbsoluteChampion => Title::AbsoluteChampion,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&content)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let rules = resolve_balance(cli.balance.as_deref())?;
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    if let Command::Init { name } = &cli.command {
        let store = FileStore::create_if_missing(&cli.account, &Account::new(name.as_str()))?;
        tracing::info!(path = %store.path().display(), "account ready");
        return Ok(());
    }

    let max_turns = rules.duel.max_turns;
    let log_capacity = rules.duel.log_capacity;
    let service = ProgressionService::new(FileStore::new(&cli.account), SystemClock, rules);

    match cli.command {
        Command::Init { .. } => {}
        Command::State => print_json(&service.progression_state()?)?,
        Command::Apply { payload } => {
            let payload: BattlePayload = read_json(&payload)?;
            print_json(&service.apply_duel_result(&payload, &mut rng)?)?;
        }
        Command::Duel {
            player,
            enemy,
            strategy,
            enemy_name,
        } => {
            let strat = strategy_by_name(&strategy)
                .ok_or_else(|| format!("unknown strategy '{}' (expected one of {:?})", strategy, STRATEGY_NAMES))?;
            let player_raw: Vec<Value> = read_json(&player)?;
            let enemy_raw: Vec<Value> = read_json(&enemy)?;
            let mut duel = Duel::new(
                normalize_deck(&player_raw, "player"),
                normalize_deck(&enemy_raw, "enemy"),
                &mut rng,
            )?
            .with_log_capacity(log_capacity);
            simulate_duel(&mut duel, strat.as_ref(), max_turns, &mut rng)?;
            let payload = BattlePayload::from_duel(&duel, enemy_name).ok_or("duel did not finish")?;
            print_json(&service.apply_duel_result(&payload, &mut rng)?)?;
        }
        Command::GrantXp { amount } => print_json(&service.grant_xp_reward(amount)?)?,
        Command::Bonuses {
            xp_daily,
            xp_potion,
            xp_guild_arena,
            xp_event,
            silver_daily,
            silver_potion,
            silver_guild_arena,
            silver_event,
        } => {
            let patch = BonusPatch {
                xp_daily,
                xp_potion,
                xp_guild_arena,
                xp_event,
                silver_daily,
                silver_potion,
                silver_guild_arena,
                silver_event,
            };
            print_json(&service.set_bonuses(&patch)?.bonuses)?;
        }
        Command::GuildLevel { level } => {
            let acc = service.set_guild_level(level)?;
            println!("guild level: {}", acc.guild_level);
        }
        Command::Title { title, off } => {
            let acc = service.toggle_title(title.into(), !off)?;
            print_json(&acc.titles)?;
        }
        Command::League { id } => {
            let acc = service.set_duel_league(&id)?;
            println!("duel league: {}", acc.league_id);
        }
        Command::Arena { result } => print_json(&service.apply_arena_result(result, &mut rng)?)?,
    }

    Ok(())
}
