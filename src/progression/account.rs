//! Persistent account progression record.
//!
//! The record is owned by an `AccountStore`; progression code only sees it
//! through a mutable borrow inside one mutation. `normalize` is applied
//! before and after every mutation so clamps hold at rest.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::progression::clock::DayKey;
use crate::progression::experience::Medal;
use crate::progression::leagues::{arena_leagues, duel_leagues};

pub const MAX_GUILD_LEVEL: u32 = 999;
pub const MAX_GOLD_PITY: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Title {
    TournamentChampion,
    DuelChampion,
    AbsoluteChampion,
}

/// Named percentage bonuses. Each field has its own cap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bonuses {
    pub xp_daily: u32,
    pub xp_potion: u32,
    pub xp_guild_arena: u32,
    pub xp_event: u32,
    pub silver_daily: u32,
    pub silver_potion: u32,
    pub silver_guild_arena: u32,
    pub silver_event: u32,
}

impl Bonuses {
    pub fn clamp(&mut self) {
        self.xp_daily = self.xp_daily.min(300);
        self.xp_potion = self.xp_potion.min(100);
        self.xp_guild_arena = self.xp_guild_arena.min(100);
        self.xp_event = self.xp_event.min(1000);
        self.silver_daily = self.silver_daily.min(100);
        self.silver_potion = self.silver_potion.min(100);
        self.silver_guild_arena = self.silver_guild_arena.min(100);
        self.silver_event = self.silver_event.min(1000);
    }

    pub fn xp_total(&self) -> u32 {
        [self.xp_daily, self.xp_potion, self.xp_guild_arena, self.xp_event]
            .into_iter()
            .fold(0u32, u32::saturating_add)
    }

    pub fn silver_total(&self) -> u32 {
        [self.silver_daily, self.silver_potion, self.silver_guild_arena, self.silver_event]
            .into_iter()
            .fold(0u32, u32::saturating_add)
    }
}

/// Partial bonus update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BonusPatch {
    pub xp_daily: Option<u32>,
    pub xp_potion: Option<u32>,
    pub xp_guild_arena: Option<u32>,
    pub xp_event: Option<u32>,
    pub silver_daily: Option<u32>,
    pub silver_potion: Option<u32>,
    pub silver_guild_arena: Option<u32>,
    pub silver_event: Option<u32>,
}

impl BonusPatch {
    pub fn apply(&self, b: &mut Bonuses) {
        let set = |dst: &mut u32, src: Option<u32>| {
            if let Some(v) = src {
                *dst = v;
            }
        };
        set(&mut b.xp_daily, self.xp_daily);
        set(&mut b.xp_potion, self.xp_potion);
        set(&mut b.xp_guild_arena, self.xp_guild_arena);
        set(&mut b.xp_event, self.xp_event);
        set(&mut b.silver_daily, self.silver_daily);
        set(&mut b.silver_potion, self.silver_potion);
        set(&mut b.silver_guild_arena, self.silver_guild_arena);
        set(&mut b.silver_event, self.silver_event);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelRecord {
    pub rating: u64,
    pub promoted_league_ids: BTreeSet<String>,
    pub highest_locked_league_id: Option<String>,
    pub daily_gold: u64,
    pub daily_gold_date: Option<DayKey>,
    pub gold_pity: u32,
    pub played: u64,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
}

/// Separate arena ladder. Absent until the account first enters the arena.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaRecord {
    pub rating: u64,
    pub league_id: String,
    pub promoted_league_ids: BTreeSet<String>,
    pub highest_locked_league_id: Option<String>,
    pub has_mythic_cup: bool,
    pub played: u64,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    pub card_drops: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub name: String,
    pub xp_total: u64,
    pub league_id: String,
    pub guild_level: u32,
    pub bonuses: Bonuses,
    pub duel: DuelRecord,
    pub arena: Option<ArenaRecord>,
    pub medals: Vec<Medal>,
    pub titles: BTreeSet<Title>,
    /// Catalog ids of cards the account has found, for collection bonuses.
    pub found_cards: BTreeSet<String>,
    pub silver: u64,
    pub gold: u64,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            name: String::new(),
            xp_total: 0,
            league_id: duel_leagues().default_id().to_string(),
            guild_level: 0,
            bonuses: Bonuses::default(),
            duel: DuelRecord::default(),
            arena: None,
            medals: Vec::new(),
            titles: BTreeSet::new(),
            found_cards: BTreeSet::new(),
            silver: 0,
            gold: 0,
        }
    }
}

impl Account {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn has_title(&self, title: Title) -> bool {
        self.titles.contains(&title)
    }

    /// Restore the at-rest invariants: known league id, clamped bonuses,
    /// guild level and pity within range.
    pub fn normalize(&mut self) {
        let leagues = duel_leagues();
        if leagues.get(&self.league_id).is_none() {
            self.league_id = leagues.default_id().to_string();
        }
        self.guild_level = self.guild_level.min(MAX_GUILD_LEVEL);
        self.bonuses.clamp();
        self.duel.gold_pity = self.duel.gold_pity.min(MAX_GOLD_PITY);
        self.duel
            .promoted_league_ids
            .retain(|id| !id.trim().is_empty());
        if let Some(arena) = self.arena.as_mut() {
            arena.normalize();
        }
    }

    pub fn set_guild_level(&mut self, level: u32) {
        self.guild_level = level.min(MAX_GUILD_LEVEL);
    }

    pub fn set_bonuses(&mut self, patch: &BonusPatch) {
        patch.apply(&mut self.bonuses);
        self.bonuses.clamp();
    }

    pub fn toggle_title(&mut self, title: Title, enabled: bool) {
        if enabled {
            self.titles.insert(title);
        } else {
            self.titles.remove(&title);
        }
    }

    /// Set the duel league directly. Unknown ids are ignored.
    pub fn set_duel_league(&mut self, league_id: &str) -> bool {
        match duel_leagues().get(league_id) {
            Some(l) => {
                self.league_id = l.id.to_string();
                true
            }
            None => false,
        }
    }
}

impl ArenaRecord {
    pub fn normalize(&mut self) {
        let leagues = arena_leagues();
        if leagues.get(&self.league_id).is_none() {
            self.league_id = leagues.by_rating(self.rating).id.to_string();
        }
    }
}
