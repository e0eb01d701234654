//! Synchronous duel driver: plays a duel to completion with a strategy.
//! Used by the arena runner and the benches.

use rand::RngCore;

use crate::engine::duel::{Duel, TurnOutcome};
use crate::engine::models::DuelOutcome;
use crate::engine::strategy::SlotStrategy;
use crate::error::DuelError;

/// Final numbers of one simulated duel.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub result: DuelOutcome,
    pub turns: u32,
    pub damage_dealt: u64,
    pub player_hp: i64,
    pub enemy_hp: i64,
}

/// Drive `duel` until it finishes. `max_steps` bounds the number of
/// `play_turn` calls, refills included.
pub fn simulate_duel(
    duel: &mut Duel,
    strategy: &dyn SlotStrategy,
    max_steps: u32,
    rng: &mut dyn RngCore,
) -> Result<SimulationResult, DuelError> {
    for _ in 0..max_steps {
        if let Some(result) = duel.result() {
            return Ok(summarize(duel, result));
        }
        let slot = strategy.choose_slot(duel, rng);
        if let TurnOutcome::AlreadyFinished = duel.play_turn(slot, rng)? {
            break;
        }
    }

    match duel.result() {
        Some(result) => Ok(summarize(duel, result)),
        None => {
            tracing::warn!(max_steps, turn = duel.turn(), "simulated duel stalled");
            Err(DuelError::Stalled { max_turns: max_steps })
        }
    }
}

fn summarize(duel: &Duel, result: DuelOutcome) -> SimulationResult {
    SimulationResult {
        result,
        turns: duel.turn(),
        damage_dealt: duel.damage_dealt(),
        player_hp: duel.player().hp,
        enemy_hp: duel.enemy().hp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::models::{Card, Element, Side};
    use crate::engine::strategy::{GreedySlot, RandomSlot};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn deck(prefix: &str, element: Element, power: u32) -> Vec<Card> {
        (0..9)
            .map(|i| Card::new(format!("{prefix}{i}"), element, power))
            .collect()
    }

    #[test]
    fn advantaged_deck_wins() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut duel = Duel::new(deck("p", Element::Water, 10), deck("e", Element::Fire, 10), &mut rng).unwrap();
        let res = simulate_duel(&mut duel, &GreedySlot, 500, &mut rng).unwrap();
        assert_eq!(res.result, DuelOutcome::Win);
        assert_eq!(res.damage_dealt, 90);
        assert!(res.enemy_hp <= 0);
        assert!(res.player_hp > 0);
    }

    #[test]
    fn mirror_match_is_a_draw() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut duel = Duel::new(deck("p", Element::Air, 7), deck("e", Element::Air, 7), &mut rng).unwrap();
        let res = simulate_duel(&mut duel, &RandomSlot, 500, &mut rng).unwrap();
        assert_eq!(res.result, DuelOutcome::Draw);
        assert_eq!(res.turns, 9);
    }

    #[test]
    fn step_budget_reports_stall() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut duel = Duel::new(deck("p", Element::Air, 7), deck("e", Element::Air, 7), &mut rng).unwrap();
        duel.set_hp(Side::Player, 1_000_000);
        duel.set_hp(Side::Enemy, 1_000_000);
        let err = simulate_duel(&mut duel, &RandomSlot, 10, &mut rng).unwrap_err();
        assert_eq!(err, DuelError::Stalled { max_turns: 10 });
    }
}
