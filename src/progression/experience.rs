//! XP curve, level lookup and level-up handling.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::progression::clock::DayKey;

pub const MAX_LEVEL: u32 = 120;

/// Levels that award a medal the first time they are reached.
pub const MEDAL_LEVELS: [u32; 9] = [80, 85, 90, 95, 100, 105, 110, 115, 120];

/// XP needed to go from level `n - 1` to level `n`, for `n` in 2..=80.
const EARLY_REQUIREMENTS: [u64; 79] = [
    240, 500, 1_000, 2_000, 13_000, 31_000, 49_500, 72_500, 99_000, // 2..=10
    140_000, 175_000, 220_000, 270_000, 330_000, 400_000, 475_000, 545_000, 620_000, 700_000,
    780_000, 870_000, 970_000, 1_070_000, 1_170_000, 1_280_000, 1_420_000, 1_550_000, 1_700_000,
    1_850_000, // ..=30
    2_010_000, 2_170_000, 2_330_000, 2_500_000, 2_680_000, 2_880_000, 3_060_000, 3_240_000,
    3_440_000, 3_620_000, // ..=40
    3_820_000, 4_020_000, 4_240_000, 4_440_000, 4_680_000, 4_920_000, 5_180_000, 5_420_000,
    5_680_000, 5_960_000, // ..=50
    11_630_000, 12_910_000, 14_310_000, 15_760_000, 17_260_000, 18_810_000, 20_410_000,
    22_050_000, 23_750_000, 25_500_000, // ..=60
    45_000_000, 48_900_000, 53_000_000, 57_200_000, 61_500_000, 66_000_000, 70_500_000,
    75_000_000, 80_000_000, 85_000_000, // ..=70
    100_000_000, 120_000_000, 140_000_000, 160_000_000, 180_000_000, 200_000_000, 220_000_000,
    240_000_000, 260_000_000, 280_000_000, // ..=80
];

/// Indexed by level; entries 0 and 1 are zero.
static XP_REQUIREMENTS: Lazy<[u64; MAX_LEVEL as usize + 1]> = Lazy::new(|| {
    let mut req = [0u64; MAX_LEVEL as usize + 1];
    req[2..=80].copy_from_slice(&EARLY_REQUIREMENTS);
    for level in 81..=MAX_LEVEL as usize {
        // Flat tiers of ten levels each: 1e9, 2e9, 3e9, 4e9.
        req[level] = ((level as u64 - 81) / 10 + 1) * 1_000_000_000;
    }
    req
});

/// Total XP at which each level is reached.
static XP_THRESHOLDS: Lazy<[u64; MAX_LEVEL as usize + 1]> = Lazy::new(|| {
    let mut total = [0u64; MAX_LEVEL as usize + 1];
    for level in 2..=MAX_LEVEL as usize {
        total[level] = total[level - 1] + XP_REQUIREMENTS[level];
    }
    total
});

/// XP needed to advance from `level - 1` into `level`.
pub fn xp_required(level: u32) -> Option<u64> {
    (2..=MAX_LEVEL)
        .contains(&level)
        .then(|| XP_REQUIREMENTS[level as usize])
}

pub fn level_for_xp(xp_total: u64) -> u32 {
    // Level 1 starts at zero XP, so the count is at least 1.
    XP_THRESHOLDS[1..].partition_point(|&t| t <= xp_total) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelProgress {
    pub level: u32,
    pub xp_into_level: u64,
    /// `None` at the level cap.
    pub xp_for_next_level: Option<u64>,
    pub percent: u32,
}

pub fn level_progress(xp_total: u64) -> LevelProgress {
    let level = level_for_xp(xp_total);
    let xp_into_level = xp_total - XP_THRESHOLDS[level as usize];
    let xp_for_next_level = xp_required(level + 1);
    let percent = match xp_for_next_level {
        Some(next) => ((xp_into_level as f64 / next.max(1) as f64) * 100.0).round() as u32,
        None => 100,
    };
    LevelProgress {
        level,
        xp_into_level,
        xp_for_next_level,
        percent,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedalKind {
    Bronze,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medal {
    pub level: u32,
    pub kind: MedalKind,
    #[serde(default)]
    pub earned_on: Option<DayKey>,
}

/// Outcome of one XP grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XpGrant {
    pub xp_gain: u64,
    pub new_xp_total: u64,
    pub level_before: u32,
    pub level_after: u32,
    pub levels_crossed: Vec<u32>,
    /// Sum of every crossed level number.
    pub flat_gold_reward: u64,
    pub medals_earned: Vec<Medal>,
}

/// Add `gain` XP to `xp_total`, appending a medal to `medals` for each
/// crossed milestone level not already present.
pub fn grant_xp(xp_total: u64, gain: u64, medals: &mut Vec<Medal>, today: DayKey) -> XpGrant {
    let new_xp_total = xp_total.saturating_add(gain);
    let level_before = level_for_xp(xp_total);
    let level_after = level_for_xp(new_xp_total);
    let levels_crossed: Vec<u32> = (level_before + 1..=level_after).collect();
    let flat_gold_reward = levels_crossed.iter().map(|&l| l as u64).sum();

    let mut medals_earned = Vec::new();
    for &level in &levels_crossed {
        if !MEDAL_LEVELS.contains(&level) || medals.iter().any(|m| m.level == level) {
            continue;
        }
        let medal = Medal {
            level,
            kind: MedalKind::Bronze,
            earned_on: Some(today),
        };
        medals.push(medal.clone());
        medals_earned.push(medal);
    }

    if level_after > level_before {
        tracing::info!(
            level_before,
            level_after,
            gold = flat_gold_reward,
            medals = medals_earned.len(),
            "level up"
        );
    }

    XpGrant {
        xp_gain: gain,
        new_xp_total,
        level_before,
        level_after,
        levels_crossed,
        flat_gold_reward,
        medals_earned,
    }
}
