//! Battle result pipeline: rating and league, then XP and levels, then
//! silver and gold, all inside one account mutation.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::BalanceConfig;
use crate::engine::duel::Duel;
use crate::engine::models::{DuelOutcome, TurnRecord};
use crate::error::PipelineError;
use crate::progression::account::{Account, BonusPatch, Bonuses, Title};
use crate::progression::arena_mode::{apply_arena_battle, enter_arena, ArenaSummary};
use crate::progression::clock::{current_day_key, Clock, DayKey};
use crate::progression::experience::{grant_xp, level_progress, Medal};
use crate::progression::leagues::{duel_leagues, rating_delta, LeagueProgress, LeagueRef, RatingRequest};
use crate::progression::rewards::{
    bump_pity, daily_gold_limit, ensure_daily_reset, roll_gold, settle_gold, silver_bonus_pct,
    silver_reward, xp_bonus_pct, xp_gain, CollectionFlags,
};
use crate::progression::store::AccountStore;

/// Everything the pipeline needs to know about a finished duel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattlePayload {
    pub result: DuelOutcome,
    #[serde(default)]
    pub enemy_name: String,
    #[serde(default)]
    pub player_hp: i64,
    #[serde(default)]
    pub player_max_hp: i64,
    #[serde(default)]
    pub enemy_hp: i64,
    #[serde(default)]
    pub enemy_max_hp: i64,
    #[serde(default)]
    pub damage_dealt: u64,
    /// Overrides the configured rating change.
    #[serde(default)]
    pub rating_delta: Option<i64>,
    #[serde(default)]
    pub xp_bonus_pct: u32,
    #[serde(default)]
    pub silver_bonus_pct: u32,
    /// Recent turns for display.
    #[serde(default)]
    pub log: Vec<TurnRecord>,
}

impl BattlePayload {
    pub fn new(result: DuelOutcome, damage_dealt: u64) -> Self {
        Self {
            result,
            enemy_name: String::new(),
            player_hp: 0,
            player_max_hp: 0,
            enemy_hp: 0,
            enemy_max_hp: 0,
            damage_dealt,
            rating_delta: None,
            xp_bonus_pct: 0,
            silver_bonus_pct: 0,
            log: Vec::new(),
        }
    }

    /// Build a payload from a finished duel. Returns `None` while the duel
    /// is still running.
    pub fn from_duel(duel: &Duel, enemy_name: impl Into<String>) -> Option<Self> {
        let result = duel.result()?;
        Some(Self {
            result,
            enemy_name: enemy_name.into(),
            player_hp: duel.player().hp,
            player_max_hp: duel.player().max_hp,
            enemy_hp: duel.enemy().hp,
            enemy_max_hp: duel.enemy().max_hp,
            damage_dealt: duel.damage_dealt(),
            rating_delta: None,
            xp_bonus_pct: 0,
            silver_bonus_pct: 0,
            log: duel.log().cloned().collect(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HpView {
    pub hp: i64,
    pub max_hp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueView {
    pub id: String,
    pub name: String,
    pub base_silver: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingView {
    pub before: u64,
    pub after: u64,
    /// Applied change, `after - before`. Smaller than the requested delta
    /// when the rating bottoms out at zero.
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueTransition {
    pub from: LeagueRef,
    pub to: LeagueRef,
    pub promo_silver: u64,
    pub in_buffer: bool,
    pub lock_applied: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DuelCounters {
    pub played: u64,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XpView {
    pub base: u64,
    pub gained: u64,
    pub bonus_pct: u32,
    pub level_before: u32,
    pub level_after: u32,
    pub level_up_gold: u64,
    pub medals_earned: Vec<Medal>,
    pub into_level: u64,
    pub next_req: Option<u64>,
    pub progress_percent: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewardView {
    /// Duel silver plus promotion silver.
    pub silver: u64,
    pub duel_silver: u64,
    pub promo_silver: u64,
    pub gold: u64,
    pub gold_dropped: bool,
    pub silver_bonus_pct: u32,
    pub gold_today: u64,
    pub gold_limit: u64,
    pub gold_pity: u32,
}

/// The externally observable result of applying one battle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleSummary {
    pub result: DuelOutcome,
    pub enemy_name: String,
    pub player: HpView,
    pub enemy: HpView,
    pub league: LeagueView,
    pub rating: RatingView,
    pub league_transition: LeagueTransition,
    pub duel: DuelCounters,
    pub xp: XpView,
    pub rewards: RewardView,
    pub log: Vec<TurnRecord>,
    pub day: DayKey,
}

/// Apply one battle result to `acc`. Pure apart from `rng`; the caller owns
/// persistence. The account is normalized first, so raw records are safe.
pub fn apply_battle(
    acc: &mut Account,
    payload: &BattlePayload,
    flags: &CollectionFlags,
    rules: &BalanceConfig,
    today: DayKey,
    rng: &mut dyn RngCore,
) -> BattleSummary {
    acc.normalize();
    let leagues = duel_leagues();
    let result = payload.result;
    ensure_daily_reset(&mut acc.duel, today);

    // Rating and league.
    let delta = rating_delta(result, &rules.rating, payload.rating_delta);
    let adv = leagues.advance_rating(&RatingRequest {
        old_rating: acc.duel.rating,
        current_league_id: &acc.league_id,
        highest_locked_league_id: acc.duel.highest_locked_league_id.as_deref(),
        rating_delta: delta,
        promoted_league_ids: &acc.duel.promoted_league_ids,
        demotion_buffer: rules.rating.demotion_buffer,
    });
    acc.duel.rating = adv.new_rating;
    acc.league_id = adv.league_after.id.clone();
    acc.duel.highest_locked_league_id = adv.highest_locked_league_id.clone();
    if let Some(promo) = &adv.promotion {
        acc.duel.promoted_league_ids.insert(promo.league_id.clone());
    }
    let promo_silver = adv.promo_silver();

    // XP before rewards: the gold limit depends on the new level.
    let xp_pct = xp_bonus_pct(acc, payload.xp_bonus_pct.min(rules.bonus.cap));
    let gained = xp_gain(payload.damage_dealt, xp_pct);
    let grant = grant_xp(acc.xp_total, gained, &mut acc.medals, today);
    acc.xp_total = grant.new_xp_total;
    acc.gold += grant.flat_gold_reward;

    // Rewards.
    let league = leagues.get_or_default(&acc.league_id);
    let silver_pct = silver_bonus_pct(acc, flags, payload.silver_bonus_pct.min(rules.bonus.cap));
    let duel_silver = silver_reward(league.base_silver, result, silver_pct, &rules.silver);
    let mut gold_limit = daily_gold_limit(grant.level_after, flags, acc.has_title(Title::TournamentChampion));
    let mut duel_gold = 0;
    let mut gold_dropped = false;

    if result == DuelOutcome::Win {
        let roll = roll_gold(gold_limit, acc.duel.daily_gold, acc.duel.gold_pity, flags, &rules.gold, rng);
        settle_gold(&mut acc.duel, &roll, &rules.gold);
        gold_limit = roll.limit;
        gold_dropped = roll.dropped;
        duel_gold = roll.amount;
    } else {
        bump_pity(&mut acc.duel, &rules.gold);
    }

    acc.silver += duel_silver + promo_silver;
    acc.gold += duel_gold;

    acc.duel.played += 1;
    match result {
        DuelOutcome::Win => acc.duel.wins += 1,
        DuelOutcome::Lose => acc.duel.losses += 1,
        DuelOutcome::Draw => acc.duel.draws += 1,
    }

    let progress = level_progress(acc.xp_total);
    let log_start = payload.log.len().saturating_sub(rules.duel.log_capacity);

    tracing::info!(
        account = %acc.name,
        %result,
        rating = acc.duel.rating,
        league = %acc.league_id,
        xp = gained,
        silver = duel_silver + promo_silver,
        gold = duel_gold,
        pity = acc.duel.gold_pity,
        "battle applied"
    );

    BattleSummary {
        result,
        enemy_name: payload.enemy_name.clone(),
        player: HpView {
            hp: payload.player_hp,
            max_hp: payload.player_max_hp,
        },
        enemy: HpView {
            hp: payload.enemy_hp,
            max_hp: payload.enemy_max_hp,
        },
        league: LeagueView {
            id: league.id.to_string(),
            name: league.name.to_string(),
            base_silver: league.base_silver,
        },
        rating: RatingView {
            before: adv.old_rating,
            after: adv.new_rating,
            delta: adv.rating_delta,
        },
        league_transition: LeagueTransition {
            from: adv.league_before,
            to: adv.league_after,
            promo_silver,
            in_buffer: adv.in_buffer,
            lock_applied: adv.lock_applied,
        },
        duel: DuelCounters {
            played: acc.duel.played,
            wins: acc.duel.wins,
            losses: acc.duel.losses,
            draws: acc.duel.draws,
        },
        xp: XpView {
            base: payload.damage_dealt,
            gained,
            bonus_pct: xp_pct,
            level_before: grant.level_before,
            level_after: grant.level_after,
            level_up_gold: grant.flat_gold_reward,
            medals_earned: grant.medals_earned,
            into_level: progress.xp_into_level,
            next_req: progress.xp_for_next_level,
            progress_percent: progress.percent,
        },
        rewards: RewardView {
            silver: duel_silver + promo_silver,
            duel_silver,
            promo_silver,
            gold: duel_gold,
            gold_dropped,
            silver_bonus_pct: silver_pct,
            gold_today: acc.duel.daily_gold,
            gold_limit,
            gold_pity: acc.duel.gold_pity,
        },
        log: payload.log[log_start..].to_vec(),
        day: today,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XpRewardSummary {
    pub xp_gain: u64,
    pub level_before: u32,
    pub level_after: u32,
    pub level_up_gold: u64,
    pub medals_earned: Vec<Medal>,
    pub into_level: u64,
    pub next_req: Option<u64>,
    pub progress_percent: u32,
}

/// Grant XP outside of a duel, e.g. a quest reward.
pub fn apply_xp_reward(acc: &mut Account, amount: u64, today: DayKey) -> XpRewardSummary {
    acc.normalize();
    let grant = grant_xp(acc.xp_total, amount, &mut acc.medals, today);
    acc.xp_total = grant.new_xp_total;
    acc.gold += grant.flat_gold_reward;
    let progress = level_progress(acc.xp_total);
    XpRewardSummary {
        xp_gain: grant.xp_gain,
        level_before: grant.level_before,
        level_after: grant.level_after,
        level_up_gold: grant.flat_gold_reward,
        medals_earned: grant.medals_earned,
        into_level: progress.xp_into_level,
        next_req: progress.xp_for_next_level,
        progress_percent: progress.percent,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuelStateView {
    pub rating: u64,
    pub league_progress: LeagueProgress,
    pub highest_locked_league_id: Option<String>,
    pub daily_gold: u64,
    pub daily_gold_limit: u64,
    pub gold_pity: u32,
    pub counters: DuelCounters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BonusView {
    pub xp_pct: u32,
    pub silver_pct: u32,
    pub flags: CollectionFlags,
    pub fields: Bonuses,
}

/// Read-only progression snapshot for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressionState {
    pub name: String,
    pub level: u32,
    pub xp_total: u64,
    pub xp_into_level: u64,
    pub xp_for_next_level: Option<u64>,
    pub progress_percent: u32,
    pub league: LeagueView,
    pub duel: DuelStateView,
    pub bonuses: BonusView,
    pub medals: Vec<Medal>,
    pub titles: Vec<Title>,
    pub guild_level: u32,
    pub silver: u64,
    pub gold: u64,
}

/// Snapshot `acc` as seen on `today`. Works on a copy, so a pending daily
/// reset is reflected without being persisted.
pub fn progression_state(acc: &Account, flags: &CollectionFlags, today: DayKey) -> ProgressionState {
    let mut acc = acc.clone();
    acc.normalize();
    ensure_daily_reset(&mut acc.duel, today);

    let leagues = duel_leagues();
    let league = leagues.get_or_default(&acc.league_id);
    let progress = level_progress(acc.xp_total);

    ProgressionState {
        level: progress.level,
        xp_total: acc.xp_total,
        xp_into_level: progress.xp_into_level,
        xp_for_next_level: progress.xp_for_next_level,
        progress_percent: progress.percent,
        league: LeagueView {
            id: league.id.to_string(),
            name: league.name.to_string(),
            base_silver: league.base_silver,
        },
        duel: DuelStateView {
            rating: acc.duel.rating,
            league_progress: leagues.progress(acc.duel.rating, league.id),
            highest_locked_league_id: acc.duel.highest_locked_league_id.clone(),
            daily_gold: acc.duel.daily_gold,
            daily_gold_limit: daily_gold_limit(progress.level, flags, acc.has_title(Title::TournamentChampion)),
            gold_pity: acc.duel.gold_pity,
            counters: DuelCounters {
                played: acc.duel.played,
                wins: acc.duel.wins,
                losses: acc.duel.losses,
                draws: acc.duel.draws,
            },
        },
        bonuses: BonusView {
            xp_pct: xp_bonus_pct(&acc, 0),
            silver_pct: silver_bonus_pct(&acc, flags, 0),
            flags: *flags,
            fields: acc.bonuses.clone(),
        },
        medals: acc.medals.clone(),
        titles: acc.titles.iter().copied().collect(),
        guild_level: acc.guild_level,
        silver: acc.silver,
        gold: acc.gold,
        name: acc.name,
    }
}

/// Store-backed front end for the pipeline.
pub struct ProgressionService<S: AccountStore, C: Clock> {
    store: S,
    clock: C,
    rules: BalanceConfig,
    /// Overrides flags derived from the account's found cards.
    collections: Option<CollectionFlags>,
}

impl<S: AccountStore, C: Clock> ProgressionService<S, C> {
    pub fn new(store: S, clock: C, rules: BalanceConfig) -> Self {
        Self {
            store,
            clock,
            rules,
            collections: None,
        }
    }

    pub fn with_collection_flags(mut self, flags: CollectionFlags) -> Self {
        self.collections = Some(flags);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn rules(&self) -> &BalanceConfig {
        &self.rules
    }

    fn flags_for(&self, acc: &Account) -> CollectionFlags {
        self.collections
            .unwrap_or_else(|| CollectionFlags::from_found(&acc.found_cards))
    }

    /// Run `f` inside one store mutation and hand back what it produced.
    fn transact<T>(&self, mut f: impl FnMut(&mut Account) -> T) -> Result<T, PipelineError> {
        let mut out = None;
        self.store.mutate_active(&mut |acc: &mut Account| {
            out = Some(f(acc));
            None
        })?;
        out.ok_or(PipelineError::MutationNotApplied)
    }

    pub fn read_account(&self) -> Result<Account, PipelineError> {
        Ok(self.store.read_active()?)
    }

    pub fn apply_duel_result(&self, payload: &BattlePayload, rng: &mut dyn RngCore) -> Result<BattleSummary, PipelineError> {
        let today = current_day_key(&self.clock);
        self.transact(|acc| {
            let flags = self.flags_for(acc);
            apply_battle(acc, payload, &flags, &self.rules, today, rng)
        })
    }

    pub fn grant_xp_reward(&self, amount: u64) -> Result<XpRewardSummary, PipelineError> {
        let today = current_day_key(&self.clock);
        self.transact(|acc| apply_xp_reward(acc, amount, today))
    }

    pub fn progression_state(&self) -> Result<ProgressionState, PipelineError> {
        let acc = self.store.read_active()?;
        let flags = self.flags_for(&acc);
        Ok(progression_state(&acc, &flags, current_day_key(&self.clock)))
    }

    /// Apply an arena result. A locked arena still commits the
    /// normalized account but returns the lock error.
    pub fn apply_arena_result(&self, result: DuelOutcome, rng: &mut dyn RngCore) -> Result<ArenaSummary, PipelineError> {
        let outcome = self.transact(|acc| {
            apply_arena_battle(acc, result, &self.rules.arena, self.rules.rating.demotion_buffer, rng)
        })?;
        Ok(outcome?)
    }

    pub fn enter_arena(&self) -> Result<Account, PipelineError> {
        let entered = self.transact(|acc| enter_arena(acc, &self.rules.arena).map(|_| ()))?;
        entered?;
        self.read_account()
    }

    pub fn set_bonuses(&self, patch: &BonusPatch) -> Result<Account, PipelineError> {
        Ok(self.store.mutate_active(&mut |acc| {
            acc.set_bonuses(patch);
            None
        })?)
    }

    pub fn set_guild_level(&self, level: u32) -> Result<Account, PipelineError> {
        Ok(self.store.mutate_active(&mut |acc| {
            acc.set_guild_level(level);
            None
        })?)
    }

    pub fn toggle_title(&self, title: Title, enabled: bool) -> Result<Account, PipelineError> {
        Ok(self.store.mutate_active(&mut |acc| {
            acc.toggle_title(title, enabled);
            None
        })?)
    }

    pub fn set_duel_league(&self, league_id: &str) -> Result<Account, PipelineError> {
        Ok(self.store.mutate_active(&mut |acc| {
            if !acc.set_duel_league(league_id) {
                tracing::warn!(league_id, "ignoring unknown duel league");
            }
            None
        })?)
    }
}
