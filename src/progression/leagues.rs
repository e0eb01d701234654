//! League tables and the rating state machine.
//!
//! A league is keyed by a minimum rating. Moving between leagues is subject
//! to a demotion buffer (hysteresis) and to global-lock tier groups: once a
//! league flagged `global_lock` has been reached, ordinary rating loss can
//! never resolve below the lowest league of that league's group.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::config::RatingConfig;
use crate::engine::models::DuelOutcome;

pub const DUEL_DEFAULT_LEAGUE_ID: &str = "league-gray-3";
pub const ARENA_DEFAULT_LEAGUE_ID: &str = "arena-blue-3";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueDef {
    pub id: &'static str,
    pub name: &'static str,
    pub min_rating: u64,
    /// One-time silver for entering the league, if any.
    pub promo_silver: Option<u64>,
    /// Per-duel base silver.
    pub base_silver: u64,
    pub global_lock: bool,
    /// Entry needs the mythic cup (arena masters tiers).
    pub requires_cup: bool,
}

const fn league(
    id: &'static str,
    name: &'static str,
    min_rating: u64,
    promo_silver: Option<u64>,
    base_silver: u64,
    global_lock: bool,
) -> LeagueDef {
    LeagueDef {
        id,
        name,
        min_rating,
        promo_silver,
        base_silver,
        global_lock,
        requires_cup: false,
    }
}

/// Short reference to a league, as shown in summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueRef {
    pub id: String,
    pub name: String,
    pub min_rating: u64,
}

impl From<&LeagueDef> for LeagueRef {
    fn from(l: &LeagueDef) -> Self {
        Self {
            id: l.id.to_string(),
            name: l.name.to_string(),
            min_rating: l.min_rating,
        }
    }
}

/// Tier group of a league id: its first two `-` separated segments,
/// e.g. `league-gold-2` -> `league-gold`.
pub fn group_prefix(id: &str) -> &str {
    match id.match_indices('-').nth(1) {
        Some((pos, _)) => &id[..pos],
        None => id,
    }
}

/// Rating change for a duel result. An explicit override wins.
pub fn rating_delta(result: DuelOutcome, rules: &RatingConfig, explicit: Option<i64>) -> i64 {
    explicit.unwrap_or(match result {
        DuelOutcome::Win => rules.win,
        DuelOutcome::Lose => rules.lose,
        DuelOutcome::Draw => rules.draw,
    })
}

/// Inputs to one rating transition.
#[derive(Debug, Clone)]
pub struct RatingRequest<'a> {
    pub old_rating: u64,
    pub current_league_id: &'a str,
    pub highest_locked_league_id: Option<&'a str>,
    pub rating_delta: i64,
    pub promoted_league_ids: &'a BTreeSet<String>,
    pub demotion_buffer: u64,
}

/// A one-time promotion reward that the caller must record as claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Promotion {
    pub league_id: String,
    pub silver: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingAdvance {
    pub old_rating: u64,
    pub new_rating: u64,
    pub rating_delta: i64,
    pub league_before: LeagueRef,
    pub league_after: LeagueRef,
    /// The rating alone would have demoted, the buffer kept the league.
    pub in_buffer: bool,
    /// The lock floor raised the league above what the rating implies.
    pub lock_applied: bool,
    pub promotion: Option<Promotion>,
    pub highest_locked_league_id: Option<String>,
}

impl RatingAdvance {
    pub fn promo_silver(&self) -> u64 {
        self.promotion.as_ref().map_or(0, |p| p.silver)
    }
}

/// An immutable, ascending league table.
#[derive(Debug, Clone)]
pub struct LeagueTable {
    leagues: Vec<LeagueDef>,
    default_id: &'static str,
}

impl LeagueTable {
    pub fn new(mut leagues: Vec<LeagueDef>, default_id: &'static str) -> Self {
        assert!(!leagues.is_empty(), "league table must not be empty");
        leagues.sort_by_key(|l| l.min_rating);
        Self { leagues, default_id }
    }

    pub fn leagues(&self) -> &[LeagueDef] {
        &self.leagues
    }

    pub fn default_id(&self) -> &'static str {
        self.default_id
    }

    pub fn get(&self, id: &str) -> Option<&LeagueDef> {
        let id = id.trim();
        self.leagues.iter().find(|l| l.id == id)
    }

    pub fn default_league(&self) -> &LeagueDef {
        self.get(self.default_id).unwrap_or(&self.leagues[0])
    }

    /// League by id, falling back to the table default.
    pub fn get_or_default(&self, id: &str) -> &LeagueDef {
        self.get(id).unwrap_or_else(|| self.default_league())
    }

    /// Highest league whose threshold is at or below `rating`. Equal
    /// thresholds resolve to the later entry; ratings below every threshold
    /// resolve to the lowest league.
    pub fn by_rating(&self, rating: u64) -> &LeagueDef {
        let idx = self.leagues.partition_point(|l| l.min_rating <= rating);
        &self.leagues[idx.saturating_sub(1)]
    }

    /// First league with a strictly higher threshold.
    pub fn next_above(&self, min_rating: u64) -> Option<&LeagueDef> {
        self.leagues.iter().find(|l| l.min_rating > min_rating)
    }

    /// Lowest league sharing `id`'s tier group.
    pub fn group_floor(&self, id: &str) -> Option<&LeagueDef> {
        let prefix = group_prefix(id);
        self.leagues.iter().find(|l| group_prefix(l.id) == prefix)
    }

    pub fn advance_rating(&self, req: &RatingRequest<'_>) -> RatingAdvance {
        let new_rating = (req.old_rating as i64).saturating_add(req.rating_delta).max(0) as u64;
        let current = self
            .get(req.current_league_id)
            .unwrap_or_else(|| self.by_rating(req.old_rating));

        let mut league = self.by_rating(new_rating);

        let mut lock_applied = false;
        if let Some(floor) = req
            .highest_locked_league_id
            .and_then(|id| self.get(id))
            .filter(|l| l.global_lock)
            .and_then(|l| self.group_floor(l.id))
        {
            if league.min_rating < floor.min_rating {
                league = floor;
                lock_applied = true;
            }
        }

        let mut in_buffer = false;
        if league.min_rating < current.min_rating {
            let buffer_floor = current.min_rating as i64 - req.demotion_buffer as i64;
            if new_rating as i64 > buffer_floor {
                league = current;
                in_buffer = true;
            }
        }

        let promotion = match league.promo_silver {
            Some(silver)
                if silver > 0
                    && league.min_rating > current.min_rating
                    && !req.promoted_league_ids.contains(league.id) =>
            {
                Some(Promotion {
                    league_id: league.id.to_string(),
                    silver,
                })
            }
            _ => None,
        };

        let prior_locked = req.highest_locked_league_id.and_then(|id| self.get(id));
        let highest_locked_league_id = match prior_locked {
            Some(prior) if !league.global_lock || league.min_rating <= prior.min_rating => {
                Some(prior.id.to_string())
            }
            _ if league.global_lock => Some(league.id.to_string()),
            _ => req.highest_locked_league_id.map(str::to_string),
        };

        if league.id != current.id {
            tracing::info!(
                from = current.id,
                to = league.id,
                old_rating = req.old_rating,
                new_rating,
                promo = promotion.as_ref().map_or(0, |p| p.silver),
                "league changed"
            );
        } else if in_buffer {
            tracing::debug!(league = league.id, new_rating, "demotion held by buffer");
        }

        RatingAdvance {
            old_rating: req.old_rating,
            new_rating,
            rating_delta: new_rating as i64 - req.old_rating as i64,
            league_before: LeagueRef::from(current),
            league_after: LeagueRef::from(league),
            in_buffer,
            lock_applied,
            promotion,
            highest_locked_league_id,
        }
    }
}

/// Position of a rating between its league and the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueProgress {
    pub current: LeagueRef,
    pub next: Option<LeagueRef>,
    pub into: u64,
    pub span: Option<u64>,
    pub pct: u32,
    pub to_next: u64,
}

impl LeagueTable {
    pub fn progress(&self, rating: u64, current_id: &str) -> LeagueProgress {
        let current = self.get(current_id).unwrap_or_else(|| self.by_rating(rating));
        let next = self.next_above(current.min_rating);
        let into = rating.saturating_sub(current.min_rating);
        let span = next.map(|n| (n.min_rating - current.min_rating).max(1));
        let pct = match span {
            Some(span) => ((into as f64 / span as f64) * 100.0).round().clamp(0.0, 100.0) as u32,
            None => 100,
        };
        LeagueProgress {
            current: LeagueRef::from(current),
            next: next.map(LeagueRef::from),
            into,
            span,
            pct,
            to_next: next.map_or(0, |n| n.min_rating.saturating_sub(rating)),
        }
    }
}

static DUEL_LEAGUES: Lazy<LeagueTable> = Lazy::new(|| {
    LeagueTable::new(
        vec![
            league("league-gray-3", "Gray III", 0, None, 100, false),
            league("league-gray-2", "Gray II", 500, Some(1_000), 120, false),
            league("league-gray-1", "Gray I", 600, Some(2_000), 150, false),
            league("league-green-3", "Green III", 800, Some(3_000), 200, false),
            league("league-green-2", "Green II", 1000, Some(4_000), 250, false),
            league("league-green-1", "Green I", 1200, Some(5_000), 300, false),
            league("league-blue-3", "Blue III", 1400, Some(6_000), 400, false),
            league("league-blue-2", "Blue II", 1600, Some(7_000), 450, false),
            league("league-blue-1", "Blue I", 1800, Some(8_000), 500, false),
            league("league-purple-3", "Epic III", 2000, Some(10_000), 600, false),
            league("league-purple-2", "Epic II", 2200, Some(15_000), 650, false),
            league("league-purple-1", "Epic I", 2400, Some(20_000), 700, false),
            league("league-gold-3", "Legendary III", 2600, Some(30_000), 1000, true),
            league("league-gold-2", "Legendary II", 2800, Some(40_000), 1200, true),
            league("league-gold-1", "Legendary I", 3000, Some(50_000), 1500, true),
            league("league-black-3", "Mythic III", 3200, Some(70_000), 2000, true),
            league("league-black-2", "Mythic II", 3400, Some(80_000), 2200, true),
            league("league-black-1", "Mythic I", 3600, Some(100_000), 2500, true),
            league("league-masters-3", "Masters III", 3800, Some(120_000), 3000, true),
            league("league-masters-2", "Masters II", 4000, Some(150_000), 3500, true),
            league("league-masters-1", "Masters I", 4200, Some(200_000), 4000, true),
        ],
        DUEL_DEFAULT_LEAGUE_ID,
    )
});

static ARENA_LEAGUES: Lazy<LeagueTable> = Lazy::new(|| {
    let mut leagues = vec![
        league("arena-green-3", "Green III", 800, Some(3_000), 400, false),
        league("arena-green-2", "Green II", 1000, Some(4_000), 500, false),
        league("arena-green-1", "Green I", 1200, Some(5_000), 600, false),
        league("arena-blue-3", "Blue III", 1400, Some(6_000), 800, false),
        league("arena-blue-2", "Blue II", 1600, Some(7_000), 900, false),
        league("arena-blue-1", "Blue I", 1800, Some(8_000), 1000, false),
        league("arena-purple-3", "Epic III", 2000, Some(10_000), 1200, false),
        league("arena-purple-2", "Epic II", 2200, Some(15_000), 1300, false),
        league("arena-purple-1", "Epic I", 2400, Some(20_000), 1400, false),
        league("arena-gold-3", "Legendary III", 2600, Some(30_000), 2000, true),
        league("arena-gold-2", "Legendary II", 2800, Some(40_000), 2400, true),
        league("arena-gold-1", "Legendary I", 3000, Some(50_000), 3000, true),
        league("arena-black-3", "Mythic III", 3200, Some(70_000), 4000, true),
        league("arena-black-2", "Mythic II", 3400, Some(80_000), 4400, true),
        league("arena-black-1", "Mythic I", 3600, Some(100_000), 5000, true),
        league("arena-masters-3", "Masters III", 3800, Some(120_000), 6000, true),
        league("arena-masters-2", "Masters II", 4000, Some(150_000), 7000, true),
        league("arena-masters-1", "Masters I", 4200, Some(200_000), 8000, true),
    ];
    for l in leagues.iter_mut().filter(|l| group_prefix(l.id) == "arena-masters") {
        l.requires_cup = true;
    }
    LeagueTable::new(leagues, ARENA_DEFAULT_LEAGUE_ID)
});

pub fn duel_leagues() -> &'static LeagueTable {
    &DUEL_LEAGUES
}

pub fn arena_leagues() -> &'static LeagueTable {
    &ARENA_LEAGUES
}
