pub mod models;
pub mod elements;
pub mod normalize;
pub mod duel;
pub mod strategy;
pub mod simulator;
pub mod arena;
