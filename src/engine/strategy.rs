//! Slot-choosing strategies for simulated duels.

use rand::seq::SliceRandom;
use rand::RngCore;

use crate::engine::duel::Duel;
use crate::engine::elements::damage;
use crate::engine::models::HAND_SIZE;

/// A strategy picks which mirrored hand slot the player plays next.
pub trait SlotStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn choose_slot(&self, duel: &Duel, rng: &mut dyn RngCore) -> usize;
}

/// Slots where both sides currently hold a card.
pub fn playable_slots(duel: &Duel) -> Vec<usize> {
    let p = duel.player().hand();
    let e = duel.enemy().hand();
    (0..HAND_SIZE)
        .filter(|&i| p[i].is_some() && e[i].is_some())
        .collect()
}

/// Picks a uniformly random playable slot.
pub struct RandomSlot;

impl SlotStrategy for RandomSlot {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_slot(&self, duel: &Duel, rng: &mut dyn RngCore) -> usize {
        playable_slots(duel).choose(rng).copied().unwrap_or(0)
    }
}

/// Picks the slot with the best damage exchange for the player.
/// Ties go to the lowest slot.
pub struct GreedySlot;

impl SlotStrategy for GreedySlot {
    fn name(&self) -> &str {
        "greedy"
    }

    fn choose_slot(&self, duel: &Duel, _rng: &mut dyn RngCore) -> usize {
        let p = duel.player().hand();
        let e = duel.enemy().hand();
        let mut best: Option<(i64, usize)> = None;
        for slot in 0..HAND_SIZE {
            let (Some(pc), Some(ec)) = (&p[slot], &e[slot]) else {
                continue;
            };
            let edge = damage(pc, ec).0 as i64 - damage(ec, pc).0 as i64;
            if best.map_or(true, |(b, _)| edge > b) {
                best = Some((edge, slot));
            }
        }
        best.map(|(_, slot)| slot).unwrap_or(0)
    }
}

pub const STRATEGY_NAMES: &[&str] = &["random", "greedy"];

pub fn strategy_by_name(name: &str) -> Option<Box<dyn SlotStrategy>> {
    match name {
        "random" => Some(Box::new(RandomSlot)),
        "greedy" => Some(Box::new(GreedySlot)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::models::{Card, Element};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn greedy_prefers_elemental_advantage() {
        let mut rng = StdRng::seed_from_u64(1);
        let player = (0..3)
            .map(|i| Card::new(format!("p{i}"), Element::Water, 10))
            .collect();
        let enemy = vec![
            Card::new("e0", Element::Fire, 10),
            Card::new("e1", Element::Water, 10),
            Card::new("e2", Element::Air, 10),
        ];
        let duel = Duel::new(player, enemy, &mut rng).unwrap();
        let fire_slot = duel
            .enemy()
            .hand()
            .iter()
            .position(|c| c.as_ref().map(|c| c.element) == Some(Element::Fire))
            .unwrap();
        assert_eq!(GreedySlot.choose_slot(&duel, &mut rng), fire_slot);
    }

    #[test]
    fn random_only_picks_playable_slots() {
        let mut rng = StdRng::seed_from_u64(2);
        let deck = |p: &str| {
            (0..9)
                .map(|i| Card::new(format!("{p}{i}"), Element::ALL[i % 4], 3 + i as u32))
                .collect::<Vec<_>>()
        };
        let duel = Duel::new(deck("p"), deck("e"), &mut rng).unwrap();
        for _ in 0..20 {
            assert!(RandomSlot.choose_slot(&duel, &mut rng) < HAND_SIZE);
        }
    }

    #[test]
    fn lookup_by_name() {
        for name in STRATEGY_NAMES {
            assert_eq!(strategy_by_name(name).unwrap().name(), *name);
        }
        assert!(strategy_by_name("mcts").is_none());
    }
}
