//! Arena ladder: a second rating track gated behind the duel rating.
//!
//! Shares the rating state machine with duels but uses its own table,
//! randomized rating swings, and a mythic-cup gate on the masters tiers.

use rand::{Rng, RngCore};
use serde::Serialize;

use crate::config::ArenaConfig;
use crate::engine::models::DuelOutcome;
use crate::error::ArenaModeError;
use crate::progression::account::{Account, ArenaRecord};
use crate::progression::leagues::{arena_leagues, LeagueDef, LeagueRef, RatingRequest};

pub fn can_access_arena(duel_rating: u64, rules: &ArenaConfig) -> bool {
    duel_rating >= rules.min_duel_rating
}

/// Return the account's arena record, creating it on first entry.
pub fn enter_arena<'a>(acc: &'a mut Account, rules: &ArenaConfig) -> Result<&'a mut ArenaRecord, ArenaModeError> {
    if acc.arena.is_none() {
        if !can_access_arena(acc.duel.rating, rules) {
            return Err(ArenaModeError::Locked {
                rating: acc.duel.rating,
                required: rules.min_duel_rating,
            });
        }
        let league = arena_leagues().by_rating(rules.starting_rating);
        tracing::info!(account = %acc.name, rating = rules.starting_rating, league = league.id, "entered arena");
        acc.arena = Some(ArenaRecord {
            rating: rules.starting_rating,
            league_id: league.id.to_string(),
            ..Default::default()
        });
    }
    acc.arena.as_mut().ok_or(ArenaModeError::Locked {
        rating: acc.duel.rating,
        required: rules.min_duel_rating,
    })
}

/// Rating swing for an arena result: a random amount within the
/// configured win or loss window, zero for draws.
pub fn arena_rating_delta(result: DuelOutcome, rules: &ArenaConfig, rng: &mut dyn RngCore) -> i64 {
    match result {
        DuelOutcome::Win => rng.gen_range(rules.win_min..=rules.win_max.max(rules.win_min)),
        DuelOutcome::Lose => -rng.gen_range(rules.loss_min..=rules.loss_max.max(rules.loss_min)),
        DuelOutcome::Draw => 0,
    }
}

/// Highest league an account may occupy without the mythic cup.
fn cup_ceiling(league: &'static LeagueDef, has_cup: bool) -> &'static LeagueDef {
    if has_cup || !league.requires_cup {
        return league;
    }
    arena_leagues()
        .leagues()
        .iter()
        .filter(|l| !l.requires_cup && l.min_rating <= league.min_rating)
        .last()
        .unwrap_or(league)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArenaSummary {
    pub result: DuelOutcome,
    pub rating_before: u64,
    pub rating_after: u64,
    pub rating_delta: i64,
    pub league_before: LeagueRef,
    pub league_after: LeagueRef,
    pub in_buffer: bool,
    pub promo_silver: u64,
    pub silver: u64,
    pub card_drop: bool,
    pub played: u64,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
}

/// Apply one arena result to the account. The account must be able to
/// enter the arena.
pub fn apply_arena_battle(
    acc: &mut Account,
    result: DuelOutcome,
    rules: &ArenaConfig,
    demotion_buffer: u64,
    rng: &mut dyn RngCore,
) -> Result<ArenaSummary, ArenaModeError> {
    let delta = arena_rating_delta(result, rules, rng);
    let arena = enter_arena(acc, rules)?;
    let table = arena_leagues();

    let adv = table.advance_rating(&RatingRequest {
        old_rating: arena.rating,
        current_league_id: &arena.league_id,
        highest_locked_league_id: arena.highest_locked_league_id.as_deref(),
        rating_delta: delta,
        promoted_league_ids: &arena.promoted_league_ids,
        demotion_buffer,
    });

    let resolved = table.get_or_default(&adv.league_after.id);
    let league: &'static LeagueDef = cup_ceiling(resolved, arena.has_mythic_cup);

    let mut promo_silver = 0;
    if league.id == resolved.id {
        if let Some(promo) = adv.promotion.as_ref() {
            arena.promoted_league_ids.insert(promo.league_id.clone());
            promo_silver = promo.silver;
        }
        arena.highest_locked_league_id = adv.highest_locked_league_id.clone();
    } else {
        // Held below masters: the held league's own promotion still pays.
        let before = table.get_or_default(&adv.league_before.id);
        if let Some(silver) = league.promo_silver.filter(|s| *s > 0) {
            if league.min_rating > before.min_rating && !arena.promoted_league_ids.contains(league.id) {
                arena.promoted_league_ids.insert(league.id.to_string());
                promo_silver = silver;
            }
        }
        let prior = arena.highest_locked_league_id.as_deref().and_then(|id| table.get(id));
        if league.global_lock && prior.map_or(true, |p| p.min_rating < league.min_rating) {
            arena.highest_locked_league_id = Some(league.id.to_string());
        }
        tracing::debug!(wanted = resolved.id, held = league.id, "masters tier needs the mythic cup");
    }

    arena.rating = adv.new_rating;
    arena.league_id = league.id.to_string();
    arena.played += 1;

    let mut silver = 0;
    let mut card_drop = false;
    match result {
        DuelOutcome::Win => {
            arena.wins += 1;
            silver = league.base_silver;
            card_drop = rng.gen::<f64>() < rules.card_drop_chance;
            if card_drop {
                arena.card_drops += 1;
            }
        }
        DuelOutcome::Lose => arena.losses += 1,
        DuelOutcome::Draw => arena.draws += 1,
    }

    let summary = ArenaSummary {
        result,
        rating_before: adv.old_rating,
        rating_after: adv.new_rating,
        rating_delta: adv.rating_delta,
        league_before: adv.league_before.clone(),
        league_after: LeagueRef::from(league),
        in_buffer: adv.in_buffer,
        promo_silver,
        silver: silver + promo_silver,
        card_drop,
        played: arena.played,
        wins: arena.wins,
        losses: arena.losses,
        draws: arena.draws,
    };
    acc.silver += summary.silver;

    tracing::info!(
        account = %acc.name,
        %result,
        rating = summary.rating_after,
        league = %summary.league_after.id,
        silver = summary.silver,
        card_drop,
        "arena battle applied"
    );
    Ok(summary)
}
