//! Seeded bot-vs-deck balance runner.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::engine::duel::Duel;
use crate::engine::models::{Card, DuelOutcome};
use crate::engine::simulator::{simulate_duel, SimulationResult};
use crate::engine::strategy::SlotStrategy;
use crate::error::DuelError;

/// Aggregated results from an arena run.
#[derive(Debug, Clone, Default)]
pub struct ArenaResult {
    pub strategy: String,
    pub num_games: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    pub stalled: usize,
    pub damage_dealt: Vec<f64>,
    pub turns: Vec<f64>,
    pub game_durations_ms: Vec<f64>,
}

impl ArenaResult {
    pub fn win_rate(&self) -> f64 {
        self.wins as f64 / self.num_games.max(1) as f64
    }

    pub fn avg_damage(&self) -> f64 {
        mean(&self.damage_dealt)
    }

    pub fn damage_stddev(&self) -> f64 {
        if self.damage_dealt.len() < 2 {
            return 0.0;
        }
        let avg = self.avg_damage();
        let variance = self.damage_dealt.iter().map(|d| (d - avg).powi(2)).sum::<f64>()
            / (self.damage_dealt.len() - 1) as f64;
        variance.sqrt()
    }

    pub fn avg_turns(&self) -> f64 {
        mean(&self.turns)
    }

    /// Wilson score interval for the win rate.
    pub fn confidence_interval_95(&self) -> (f64, f64) {
        let n = self.num_games;
        if n == 0 {
            return (0.0, 0.0);
        }
        let p = self.win_rate();
        let z = 1.96_f64;
        let denom = 1.0 + z * z / n as f64;
        let center = (p + z * z / (2.0 * n as f64)) / denom;
        let margin = z * ((p * (1.0 - p) + z * z / (4.0 * n as f64)) / n as f64).sqrt() / denom;
        ((center - margin).max(0.0), (center + margin).min(1.0))
    }

    pub fn summary(&self) -> String {
        let (ci_lo, ci_hi) = self.confidence_interval_95();
        let mut lines = vec![format!("Arena Results: {} ({} games)", self.strategy, self.num_games)];
        lines.push("=".repeat(60));
        lines.push(format!(
            "  {:>8}: {:3} ({:5.1}%)  [95% CI: {:.1}%-{:.1}%]",
            "Wins",
            self.wins,
            self.win_rate() * 100.0,
            ci_lo * 100.0,
            ci_hi * 100.0,
        ));
        lines.push(format!("  {:>8}: {}", "Losses", self.losses));
        lines.push(format!("  {:>8}: {}", "Draws", self.draws));
        if self.stalled > 0 {
            lines.push(format!("  {:>8}: {}", "Stalled", self.stalled));
        }
        lines.push(format!(
            "  damage={:6.1} +/- {:5.1}  turns={:4.1}",
            self.avg_damage(),
            self.damage_stddev(),
            self.avg_turns(),
        ));
        if !self.game_durations_ms.is_empty() {
            let total_ms = self.game_durations_ms.iter().sum::<f64>();
            lines.push(format!(
                "  Avg game: {:.3}ms  |  Total: {:.2}s",
                total_ms / self.game_durations_ms.len() as f64,
                total_ms / 1000.0
            ));
        }
        lines.join("\n")
    }

    fn record(&mut self, outcome: Result<SimulationResult, DuelError>, elapsed_ms: f64) {
        self.game_durations_ms.push(elapsed_ms);
        match outcome {
            Ok(sim) => {
                match sim.result {
                    DuelOutcome::Win => self.wins += 1,
                    DuelOutcome::Lose => self.losses += 1,
                    DuelOutcome::Draw => self.draws += 1,
                }
                self.damage_dealt.push(sim.damage_dealt as f64);
                self.turns.push(sim.turns as f64);
            }
            Err(_) => self.stalled += 1,
        }
    }
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

/// Play `num_games` duels of `player_deck` (driven by `strategy`) against
/// `enemy_deck`. Game `i` is seeded with `base_seed + i`, so results do not
/// depend on thread scheduling.
pub fn run_arena(
    player_deck: &[Card],
    enemy_deck: &[Card],
    strategy: &dyn SlotStrategy,
    num_games: usize,
    base_seed: u64,
    max_steps: u32,
) -> Result<ArenaResult, DuelError> {
    // Validate once up front so a bad deck fails before any work is spawned.
    Duel::new(player_deck.to_vec(), enemy_deck.to_vec(), &mut StdRng::seed_from_u64(base_seed))?;

    let games: Vec<(Result<SimulationResult, DuelError>, f64)> = (0..num_games)
        .into_par_iter()
        .map(|game_idx| {
            let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(game_idx as u64));
            let t0 = Instant::now();
            let outcome = Duel::new(player_deck.to_vec(), enemy_deck.to_vec(), &mut rng)
                .and_then(|mut duel| simulate_duel(&mut duel, strategy, max_steps, &mut rng));
            (outcome, t0.elapsed().as_secs_f64() * 1000.0)
        })
        .collect();

    let mut result = ArenaResult {
        strategy: strategy.name().to_string(),
        num_games,
        ..Default::default()
    };
    for (outcome, elapsed_ms) in games {
        result.record(outcome, elapsed_ms);
    }

    tracing::info!(
        strategy = %result.strategy,
        games = num_games,
        wins = result.wins,
        losses = result.losses,
        draws = result.draws,
        "arena run complete"
    );
    Ok(result)
}
