//! Error types for duel construction, account storage and configuration.

use thiserror::Error;

use crate::engine::models::Side;

/// Errors raised by the combat engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DuelError {
    #[error("{side} deck has {have} usable card(s), need at least {need}")]
    NotEnoughCards { side: Side, have: usize, need: usize },

    #[error("hand slot {slot} is out of range")]
    InvalidSlot { slot: usize },

    #[error("duel did not finish within {max_turns} turns")]
    Stalled { max_turns: u32 },
}

/// Errors surfaced by account store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("account store lock was poisoned")]
    LockPoisoned,

    #[error("no active account")]
    NoActiveAccount,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while loading balance configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors raised by the arena ladder.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArenaModeError {
    #[error("arena requires duel rating {required}, have {rating}")]
    Locked { rating: u64, required: u64 },
}

/// Errors raised by the progression pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Arena(#[from] ArenaModeError),

    #[error("account mutation did not run")]
    MutationNotApplied,
}
