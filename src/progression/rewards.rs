//! Silver and gold reward economy.
//!
//! Silver is a straight multiple of the league base rate. Gold is a separate
//! drop evaluated only on wins: capped per calendar day, with a pity counter
//! that raises the drop chance and forces a drop past a ceiling.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::config::{GoldConfig, SilverConfig};
use crate::engine::models::DuelOutcome;
use crate::progression::account::{Account, DuelRecord, Title, MAX_GUILD_LEVEL};
use crate::progression::clock::DayKey;
use crate::progression::experience::MAX_LEVEL;

pub const ELEMENTALS_SET: [&str; 4] = ["elem_01", "elem_02", "elem_03", "elem_04"];
pub const ANCIENT_DRAGONS_SET: [&str; 3] = ["ancient_dragon_01", "ancient_dragon_02", "ancient_dragon_03"];
pub const RARE_DRAGONS_SET: [&str; 4] = ["rare_dragon_01", "rare_dragon_02", "rare_dragon_03", "rare_dragon_04"];
pub const URFIN_MUTANTS_SET: [&str; 4] = ["urfin_mut_01", "urfin_mut_02", "urfin_mut_03", "urfin_mut_04"];

pub const ELEMENTALS_SILVER_BONUS: u32 = 10;
pub const DUEL_CHAMPION_SILVER_BONUS: u32 = 50;
pub const ANCIENT_DRAGONS_GOLD_BONUS: u64 = 5;
pub const RARE_DRAGONS_GOLD_BONUS: u64 = 10;

/// Completed card collections that feed reward formulas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionFlags {
    pub elementals: bool,
    pub ancient_dragons: bool,
    pub rare_dragons: bool,
    pub urfin_mutants: bool,
}

impl CollectionFlags {
    pub fn from_found<S: AsRef<str>>(found: impl IntoIterator<Item = S>) -> Self {
        let found: std::collections::HashSet<String> =
            found.into_iter().map(|s| s.as_ref().trim().to_string()).collect();
        let has_all = |ids: &[&str]| ids.iter().all(|id| found.contains(*id));
        Self {
            elementals: has_all(&ELEMENTALS_SET),
            ancient_dragons: has_all(&ANCIENT_DRAGONS_SET),
            rare_dragons: has_all(&RARE_DRAGONS_SET),
            urfin_mutants: has_all(&URFIN_MUTANTS_SET),
        }
    }
}

/// Additive XP bonus percent: guild level, named xp bonuses, per-call bonus.
pub fn xp_bonus_pct(acc: &Account, per_call: u32) -> u32 {
    acc.guild_level
        .min(MAX_GUILD_LEVEL)
        .saturating_add(acc.bonuses.xp_total())
        .saturating_add(per_call)
}

/// Additive silver bonus percent: guild level, named silver bonuses,
/// collection and title flats, per-call bonus.
pub fn silver_bonus_pct(acc: &Account, flags: &CollectionFlags, per_call: u32) -> u32 {
    let elementals = if flags.elementals { ELEMENTALS_SILVER_BONUS } else { 0 };
    let champion = if acc.has_title(Title::DuelChampion) {
        DUEL_CHAMPION_SILVER_BONUS
    } else {
        0
    };
    [acc.bonuses.silver_total(), elementals, champion, per_call]
        .into_iter()
        .fold(acc.guild_level.min(MAX_GUILD_LEVEL), u32::saturating_add)
}

fn apply_pct(base: f64, pct: u32) -> u64 {
    (base * (1.0 + pct as f64 / 100.0)).round().max(0.0) as u64
}

pub fn xp_gain(damage_dealt: u64, bonus_pct: u32) -> u64 {
    apply_pct(damage_dealt as f64, bonus_pct)
}

pub fn silver_reward(base_silver: u64, result: DuelOutcome, bonus_pct: u32, rules: &SilverConfig) -> u64 {
    let factor = match result {
        DuelOutcome::Win => 1.0,
        DuelOutcome::Lose | DuelOutcome::Draw => rules.loss_factor,
    };
    apply_pct(base_silver as f64 * factor, bonus_pct)
}

/// Daily duel gold cap. Derived every call, never stored.
pub fn daily_gold_limit(level: u32, flags: &CollectionFlags, tournament_champion: bool) -> u64 {
    let mut limit = level.clamp(1, MAX_LEVEL) as u64;
    if flags.ancient_dragons {
        limit += ANCIENT_DRAGONS_GOLD_BONUS;
    }
    if flags.rare_dragons {
        limit += RARE_DRAGONS_GOLD_BONUS;
    }
    if tournament_champion {
        limit *= 2;
    }
    limit
}

/// Reset the daily gold window when the day key has changed.
/// Returns true when a reset happened.
pub fn ensure_daily_reset(duel: &mut DuelRecord, today: DayKey) -> bool {
    if duel.daily_gold_date == Some(today) {
        return false;
    }
    tracing::debug!(
        previous = ?duel.daily_gold_date,
        %today,
        daily_gold = duel.daily_gold,
        pity = duel.gold_pity,
        "daily gold window reset"
    );
    duel.daily_gold_date = Some(today);
    duel.daily_gold = 0;
    duel.gold_pity = 0;
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoldRoll {
    pub dropped: bool,
    pub amount: u64,
    pub limit: u64,
    /// Chance used for the roll; 0 when the cap was already reached.
    pub chance: f64,
    pub forced: bool,
}

/// Roll the gold drop for one win.
pub fn roll_gold(
    limit: u64,
    already_today: u64,
    pity: u32,
    flags: &CollectionFlags,
    rules: &GoldConfig,
    rng: &mut dyn RngCore,
) -> GoldRoll {
    let remaining = limit.saturating_sub(already_today);
    if remaining == 0 {
        return GoldRoll {
            dropped: false,
            amount: 0,
            limit,
            chance: 0.0,
            forced: false,
        };
    }

    let chance = (rules.base_chance + pity as f64 * rules.pity_step).min(rules.max_chance);
    let forced = pity >= rules.hard_pity;
    if !forced && rng.gen::<f64>() >= chance {
        return GoldRoll {
            dropped: false,
            amount: 0,
            limit,
            chance,
            forced,
        };
    }

    let share = if flags.urfin_mutants {
        rules.collector_share
    } else {
        rules.share
    };
    let amount = ((limit as f64 * share).round() as u64).clamp(1, remaining);
    GoldRoll {
        dropped: true,
        amount,
        limit,
        chance,
        forced,
    }
}

/// Apply a gold roll to the duel record: add to today's total and reset
/// pity on a drop, otherwise bump pity up to its cap.
pub fn settle_gold(duel: &mut DuelRecord, roll: &GoldRoll, rules: &GoldConfig) {
    if roll.dropped {
        duel.daily_gold += roll.amount;
        duel.gold_pity = 0;
        tracing::info!(amount = roll.amount, today = duel.daily_gold, limit = roll.limit, "gold dropped");
    } else {
        bump_pity(duel, rules);
    }
}

pub fn bump_pity(duel: &mut DuelRecord, rules: &GoldConfig) {
    duel.gold_pity = duel.gold_pity.saturating_add(1).min(rules.pity_cap);
}
