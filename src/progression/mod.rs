pub mod clock;
pub mod leagues;
pub mod experience;
pub mod account;
pub mod rewards;
pub mod store;
pub mod arena_mode;
pub mod pipeline;

pub use account::{Account, BonusPatch, Title};
pub use clock::{Clock, DayKey, FixedClock, SystemClock};
pub use pipeline::{BattlePayload, BattleSummary, ProgressionService, ProgressionState};
pub use store::{AccountStore, FileStore, InMemoryStore};
