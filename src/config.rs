//! Balance configuration: rating deltas, gold drop tuning, silver factors.
//! Loaded from TOML at runtime by both binaries; every field has a default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub win: i64,
    pub lose: i64,
    pub draw: i64,
    /// Points below a league's threshold before a demotion takes effect.
    pub demotion_buffer: u64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            win: 30,
            lose: -20,
            draw: 10,
            demotion_buffer: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoldConfig {
    pub base_chance: f64,
    pub pity_step: f64,
    pub max_chance: f64,
    /// Pity value at which a drop is forced.
    pub hard_pity: u32,
    pub pity_cap: u32,
    /// Share of the daily limit dropped at once.
    pub share: f64,
    /// Share used when the mutant collection is complete.
    pub collector_share: f64,
}

impl Default for GoldConfig {
    fn default() -> Self {
        Self {
            base_chance: 0.2,
            pity_step: 0.15,
            max_chance: 0.9,
            hard_pity: 4,
            pity_cap: 999,
            share: 0.05,
            collector_share: 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilverConfig {
    /// Multiplier on league base silver for losses and draws.
    pub loss_factor: f64,
}

impl Default for SilverConfig {
    fn default() -> Self {
        Self { loss_factor: 0.5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusConfig {
    /// Upper bound for per-call bonus percentages.
    pub cap: u32,
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self { cap: 1000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    pub log_capacity: usize,
    /// Step budget for simulated duels.
    pub max_turns: u32,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            log_capacity: 12,
            max_turns: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub min_duel_rating: u64,
    pub starting_rating: u64,
    pub win_min: i64,
    pub win_max: i64,
    pub loss_min: i64,
    pub loss_max: i64,
    pub card_drop_chance: f64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            min_duel_rating: 2000,
            starting_rating: 1400,
            win_min: 25,
            win_max: 34,
            loss_min: 15,
            loss_max: 24,
            card_drop_chance: 0.10,
        }
    }
}

/// Top-level TOML file structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    pub rating: RatingConfig,
    pub gold: GoldConfig,
    pub silver: SilverConfig,
    pub bonus: BonusConfig,
    pub duel: DuelConfig,
    pub arena: ArenaConfig,
}

/// Load balance settings from a TOML file at the given path.
pub fn load_balance(path: &Path) -> Result<BalanceConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Try well-known paths, returning built-in defaults if none loads.
pub fn load_default_balance() -> BalanceConfig {
    let candidates = [
        "balance.toml",
        "../balance.toml",
        "/etc/duel-progression/balance.toml",
    ];
    for path in &candidates {
        let p = Path::new(path);
        if p.exists() {
            match load_balance(p) {
                Ok(balance) => {
                    tracing::info!(path = %p.display(), "loaded balance config");
                    return balance;
                }
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "failed to load balance config");
                }
            }
        }
    }
    tracing::info!("no balance.toml found, using built-in defaults");
    BalanceConfig::default()
}

/// Load from an explicit path when given, otherwise auto-discover.
pub fn resolve_balance(path: Option<&Path>) -> Result<BalanceConfig, ConfigError> {
    match path {
        Some(p) => {
            let balance = load_balance(p)?;
            tracing::info!(path = %p.display(), "loaded balance config");
            Ok(balance)
        }
        None => Ok(load_default_balance()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let toml_str = r#"
[rating]
win = 40

[gold]
hard_pity = 6
"#;
        let cfg: BalanceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.rating.win, 40);
        assert_eq!(cfg.rating.lose, -20);
        assert_eq!(cfg.rating.demotion_buffer, 100);
        assert_eq!(cfg.gold.hard_pity, 6);
        assert_eq!(cfg.gold.max_chance, 0.9);
        assert_eq!(cfg.arena, ArenaConfig::default());
    }

    #[test]
    fn empty_file_is_default() {
        let cfg: BalanceConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, BalanceConfig::default());
    }

    #[test]
    fn load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[silver]\nloss_factor = 0.25\n[duel]\nlog_capacity = 7").unwrap();
        let cfg = load_balance(f.path()).unwrap();
        assert_eq!(cfg.silver.loss_factor, 0.25);
        assert_eq!(cfg.duel.log_capacity, 7);
        assert_eq!(cfg.duel.max_turns, 500);
    }

    #[test]
    fn load_reports_parse_errors() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[rating\nwin = ").unwrap();
        let err = load_balance(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load_balance(Path::new("/nonexistent/balance.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
