//! Mirrored-slot card duel.
//!
//! Each side holds a pool of up to nine cards split between a draw pile, a
//! discard pile and a three-slot hand. A turn plays slot `i` of both hands
//! against each other; damage is exchanged simultaneously, both cards are
//! discarded and each slot is refilled from its own side's piles.
//!
//! At every rest point, for both sides independently:
//! `draw_pile.len() + discard_pile.len() + occupied(hand) == pool size`.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::RngCore;

use crate::engine::elements::damage;
use crate::engine::models::*;
use crate::error::DuelError;

/// Fewest usable cards a side may bring.
pub const MIN_CARDS: usize = HAND_SIZE;

/// Default number of turn records kept for display.
pub const DEFAULT_LOG_CAPACITY: usize = 12;

#[derive(Debug, Clone)]
pub struct DuelSide {
    all_cards: Vec<Card>,
    draw_pile: Vec<Card>,
    discard_pile: Vec<Card>,
    hand: [Option<Card>; HAND_SIZE],
    pub hp: i64,
    pub max_hp: i64,
}

impl DuelSide {
    fn new(cards: Vec<Card>, rng: &mut dyn RngCore) -> Self {
        let hp: i64 = cards.iter().map(|c| c.power as i64).sum();
        let mut draw_pile = cards.clone();
        draw_pile.shuffle(rng);

        let mut side = Self {
            all_cards: cards,
            draw_pile,
            discard_pile: Vec::new(),
            hand: Default::default(),
            hp,
            max_hp: hp,
        };
        for slot in 0..HAND_SIZE {
            side.hand[slot] = side.draw_card(None, rng);
        }
        side
    }

    pub fn all_cards(&self) -> &[Card] {
        &self.all_cards
    }

    pub fn draw_pile(&self) -> &[Card] {
        &self.draw_pile
    }

    pub fn discard_pile(&self) -> &[Card] {
        &self.discard_pile
    }

    pub fn hand(&self) -> &[Option<Card>; HAND_SIZE] {
        &self.hand
    }

    pub fn occupied_slots(&self) -> usize {
        self.hand.iter().filter(|c| c.is_some()).count()
    }

    /// Cards currently accounted for across piles and hand.
    pub fn card_count(&self) -> usize {
        self.draw_pile.len() + self.discard_pile.len() + self.occupied_slots()
    }

    pub fn is_defeated(&self) -> bool {
        self.hp <= 0
    }

    /// Draw one card, recycling the discard pile into the draw pile when the
    /// latter is empty. A card whose uid equals `avoid` is only returned when
    /// nothing else is left.
    fn draw_card(&mut self, avoid: Option<&str>, rng: &mut dyn RngCore) -> Option<Card> {
        if self.draw_pile.is_empty() && !self.discard_pile.is_empty() {
            self.draw_pile.append(&mut self.discard_pile);
            self.draw_pile.shuffle(rng);
        }

        match avoid {
            Some(uid) => match self.draw_pile.iter().rposition(|c| c.uid != uid) {
                Some(pos) => Some(self.draw_pile.remove(pos)),
                None => self.draw_pile.pop(),
            },
            None => self.draw_pile.pop(),
        }
    }

    /// Refill an empty slot. Returns true when the slot holds a card afterwards.
    fn ensure_slot(&mut self, slot: usize, rng: &mut dyn RngCore) -> bool {
        if self.hand[slot].is_none() {
            self.hand[slot] = self.draw_card(None, rng);
        }
        self.hand[slot].is_some()
    }

    /// Move a played card to the discard pile and refill its slot.
    fn cycle_played(&mut self, slot: usize, played: Card, rng: &mut dyn RngCore) {
        let uid = played.uid.clone();
        self.discard_pile.push(played);
        let next = self.draw_card(Some(&uid), rng);
        self.hand[slot] = next.or_else(|| self.discard_pile.pop());
    }
}

/// What a call to [`Duel::play_turn`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Resolved(TurnRecord),
    /// A slot was empty; it was refilled and no turn was played.
    Refilled,
    AlreadyFinished,
}

#[derive(Debug, Clone)]
pub struct Duel {
    player: DuelSide,
    enemy: DuelSide,
    turn: u32,
    log: VecDeque<TurnRecord>,
    log_capacity: usize,
    result: Option<DuelOutcome>,
}

impl Duel {
    /// Build a duel from two normalized decks. Only the first nine cards of
    /// each deck are used.
    pub fn new(
        player_cards: Vec<Card>,
        enemy_cards: Vec<Card>,
        rng: &mut dyn RngCore,
    ) -> Result<Self, DuelError> {
        let player_cards = take_pool(player_cards, Side::Player)?;
        let enemy_cards = take_pool(enemy_cards, Side::Enemy)?;

        let player = DuelSide::new(player_cards, rng);
        let enemy = DuelSide::new(enemy_cards, rng);
        tracing::debug!(
            player_hp = player.hp,
            enemy_hp = enemy.hp,
            player_cards = player.all_cards.len(),
            enemy_cards = enemy.all_cards.len(),
            "duel created"
        );

        Ok(Self {
            player,
            enemy,
            turn: 0,
            log: VecDeque::new(),
            log_capacity: DEFAULT_LOG_CAPACITY,
            result: None,
        })
    }

    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        while self.log.len() > capacity {
            self.log.pop_front();
        }
        self
    }

    /// Override a side's hp and max hp, e.g. after external bonuses.
    /// Only applies before the first turn; later calls are ignored.
    pub fn set_hp(&mut self, side: Side, hp: i64) {
        if self.turn > 0 || self.is_finished() {
            tracing::debug!(%side, turn = self.turn, "hp override after first turn ignored");
            return;
        }
        let s = self.side_mut(side);
        s.hp = hp;
        s.max_hp = hp;
    }

    pub fn side(&self, side: Side) -> &DuelSide {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut DuelSide {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }

    pub fn player(&self) -> &DuelSide {
        &self.player
    }

    pub fn enemy(&self) -> &DuelSide {
        &self.enemy
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn log(&self) -> impl Iterator<Item = &TurnRecord> {
        self.log.iter()
    }

    pub fn result(&self) -> Option<DuelOutcome> {
        self.result
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    /// Damage the player has dealt, without overkill.
    pub fn damage_dealt(&self) -> u64 {
        (self.enemy.max_hp - self.enemy.hp.max(0)).max(0) as u64
    }

    /// Play hand slot `slot` of both sides against each other.
    pub fn play_turn(&mut self, slot: usize, rng: &mut dyn RngCore) -> Result<TurnOutcome, DuelError> {
        if slot >= HAND_SIZE {
            return Err(DuelError::InvalidSlot { slot });
        }
        if self.is_finished() {
            return Ok(TurnOutcome::AlreadyFinished);
        }

        let (p_card, e_card) = match (self.player.hand[slot].take(), self.enemy.hand[slot].take()) {
            (Some(p), Some(e)) => (p, e),
            (p, e) => {
                self.player.hand[slot] = p;
                self.enemy.hand[slot] = e;
                let p = self.player.ensure_slot(slot, rng);
                let e = self.enemy.ensure_slot(slot, rng);
                tracing::debug!(slot, player_ok = p, enemy_ok = e, "refilled empty slot");
                return Ok(TurnOutcome::Refilled);
            }
        };

        let (p_dmg, p_mult) = damage(&p_card, &e_card);
        let (e_dmg, e_mult) = damage(&e_card, &p_card);

        self.enemy.hp -= p_dmg as i64;
        self.player.hp -= e_dmg as i64;

        let record = TurnRecord {
            turn: self.turn,
            slot,
            player_card: PlayedCard::from(&p_card),
            enemy_card: PlayedCard::from(&e_card),
            player_damage: p_dmg,
            player_multiplier: p_mult,
            enemy_damage: e_dmg,
            enemy_multiplier: e_mult,
        };
        self.turn += 1;
        self.push_log(record.clone());

        tracing::debug!(
            turn = record.turn,
            slot,
            player_damage = p_dmg,
            enemy_damage = e_dmg,
            player_hp = self.player.hp,
            enemy_hp = self.enemy.hp,
            "turn resolved"
        );

        self.player.cycle_played(slot, p_card, rng);
        self.enemy.cycle_played(slot, e_card, rng);

        self.result = match (self.player.is_defeated(), self.enemy.is_defeated()) {
            (true, true) => Some(DuelOutcome::Draw),
            (true, false) => Some(DuelOutcome::Lose),
            (false, true) => Some(DuelOutcome::Win),
            (false, false) => None,
        };
        if let Some(result) = self.result {
            tracing::info!(%result, turns = self.turn, damage_dealt = self.damage_dealt(), "duel finished");
        }

        Ok(TurnOutcome::Resolved(record))
    }

    fn push_log(&mut self, record: TurnRecord) {
        if self.log_capacity == 0 {
            return;
        }
        self.log.push_back(record);
        while self.log.len() > self.log_capacity {
            self.log.pop_front();
        }
    }
}

fn take_pool(mut cards: Vec<Card>, side: Side) -> Result<Vec<Card>, DuelError> {
    cards.truncate(DECK_SIZE);
    if cards.len() < MIN_CARDS {
        return Err(DuelError::NotEnoughCards {
            side,
            have: cards.len(),
            need: MIN_CARDS,
        });
    }
    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn deck(prefix: &str, n: usize) -> Vec<Card> {
        (0..n)
            .map(|i| Card::new(format!("{prefix}{i}"), Element::ALL[i % 4], 5 + i as u32))
            .collect()
    }

    fn assert_conserved(duel: &Duel) {
        for side in [Side::Player, Side::Enemy] {
            let s = duel.side(side);
            assert_eq!(s.card_count(), s.all_cards().len(), "{side} lost track of a card");
        }
    }

    #[test]
    fn rejects_short_decks_before_construction() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = Duel::new(deck("p", 2), deck("e", 9), &mut rng).unwrap_err();
        assert_eq!(err, DuelError::NotEnoughCards { side: Side::Player, have: 2, need: 3 });

        let err = Duel::new(deck("p", 9), vec![], &mut rng).unwrap_err();
        assert!(matches!(err, DuelError::NotEnoughCards { side: Side::Enemy, have: 0, .. }));
    }

    #[test]
    fn only_first_nine_cards_are_used() {
        let mut rng = StdRng::seed_from_u64(2);
        let duel = Duel::new(deck("p", 12), deck("e", 9), &mut rng).unwrap();
        assert_eq!(duel.player().all_cards().len(), DECK_SIZE);
        let expected: i64 = deck("p", 9).iter().map(|c| c.power as i64).sum();
        assert_eq!(duel.player().max_hp, expected);
        assert_eq!(duel.player().hp, expected);
    }

    #[test]
    fn initial_hand_is_full() {
        let mut rng = StdRng::seed_from_u64(3);
        let duel = Duel::new(deck("p", 9), deck("e", 9), &mut rng).unwrap();
        assert_eq!(duel.player().occupied_slots(), HAND_SIZE);
        assert_eq!(duel.enemy().occupied_slots(), HAND_SIZE);
        assert_eq!(duel.player().draw_pile().len(), 6);
        assert_conserved(&duel);
    }

    #[test]
    fn cards_are_conserved_through_a_full_duel() {
        for seed in [7u64, 11, 42, 99] {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut duel = Duel::new(deck("p", 9), deck("e", 9), &mut rng).unwrap();
            let mut slot = 0;
            while !duel.is_finished() {
                assert_conserved(&duel);
                duel.play_turn(slot % HAND_SIZE, &mut rng).unwrap();
                assert_conserved(&duel);
                slot += 1;
                assert!(slot < 1000, "duel never finished");
            }
        }
    }

    #[test]
    fn conservation_holds_with_minimal_pool() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut duel = Duel::new(deck("p", 3), deck("e", 4), &mut rng).unwrap();
        duel.set_hp(Side::Player, 10_000);
        duel.set_hp(Side::Enemy, 10_000);
        for t in 0..50 {
            duel.play_turn(t % HAND_SIZE, &mut rng).unwrap();
            assert_conserved(&duel);
            assert_eq!(duel.player().occupied_slots(), HAND_SIZE);
            assert_eq!(duel.enemy().occupied_slots(), HAND_SIZE);
        }
    }

    #[test]
    fn redraw_avoids_just_played_card() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut duel = Duel::new(deck("p", 4), deck("e", 4), &mut rng).unwrap();
        duel.set_hp(Side::Player, 10_000);
        duel.set_hp(Side::Enemy, 10_000);
        for t in 0..30 {
            let slot = t % HAND_SIZE;
            let before = duel.player().hand()[slot].clone().unwrap();
            duel.play_turn(slot, &mut rng).unwrap();
            let after = duel.player().hand()[slot].clone().unwrap();
            assert_ne!(before.uid, after.uid, "turn {t} redrew the same card");
        }
    }

    #[test]
    fn simultaneous_exchange_uses_multipliers() {
        let mut rng = StdRng::seed_from_u64(0);
        let player = vec![
            Card::new("p0", Element::Fire, 12),
            Card::new("p1", Element::Fire, 12),
            Card::new("p2", Element::Fire, 12),
        ];
        let enemy = vec![
            Card::new("e0", Element::Water, 10),
            Card::new("e1", Element::Water, 10),
            Card::new("e2", Element::Water, 10),
        ];
        let mut duel = Duel::new(player, enemy, &mut rng).unwrap();
        let out = duel.play_turn(1, &mut rng).unwrap();
        let TurnOutcome::Resolved(rec) = out else {
            panic!("expected a resolved turn");
        };
        assert_eq!(rec.player_damage, 6);
        assert_eq!(rec.player_multiplier, 0.5);
        assert_eq!(rec.enemy_damage, 15);
        assert_eq!(rec.enemy_multiplier, 1.5);
        assert_eq!(duel.enemy().hp, 30 - 6);
        assert_eq!(duel.player().hp, 36 - 15);
        assert_eq!(duel.damage_dealt(), 6);
    }

    #[test]
    fn mutual_knockout_is_a_draw() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut duel = Duel::new(deck("p", 9), deck("e", 9), &mut rng).unwrap();
        duel.set_hp(Side::Player, 1);
        duel.set_hp(Side::Enemy, 1);
        duel.play_turn(0, &mut rng).unwrap();
        assert_eq!(duel.result(), Some(DuelOutcome::Draw));
    }

    #[test]
    fn one_sided_knockouts() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut duel = Duel::new(deck("p", 9), deck("e", 9), &mut rng).unwrap();
        duel.set_hp(Side::Player, 1);
        duel.set_hp(Side::Enemy, 100_000);
        duel.play_turn(2, &mut rng).unwrap();
        assert_eq!(duel.result(), Some(DuelOutcome::Lose));

        let mut duel = Duel::new(deck("p", 9), deck("e", 9), &mut rng).unwrap();
        duel.set_hp(Side::Enemy, 1);
        duel.set_hp(Side::Player, 100_000);
        duel.play_turn(2, &mut rng).unwrap();
        assert_eq!(duel.result(), Some(DuelOutcome::Win));
        assert_eq!(duel.damage_dealt(), 1);
    }

    #[test]
    fn finished_duel_is_frozen() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut duel = Duel::new(deck("p", 9), deck("e", 9), &mut rng).unwrap();
        duel.set_hp(Side::Enemy, 1);
        duel.set_hp(Side::Player, 100_000);
        duel.play_turn(0, &mut rng).unwrap();
        let turn = duel.turn();
        let hp = duel.player().hp;

        assert_eq!(duel.play_turn(1, &mut rng).unwrap(), TurnOutcome::AlreadyFinished);
        duel.set_hp(Side::Player, 5);
        assert_eq!(duel.turn(), turn);
        assert_eq!(duel.player().hp, hp);
    }

    #[test]
    fn hp_override_is_ignored_once_play_starts() {
        let water = |prefix: &str| -> Vec<Card> {
            (0..9).map(|i| Card::new(format!("{prefix}{i}"), Element::Water, 10)).collect()
        };
        let mut rng = StdRng::seed_from_u64(6);
        let mut duel = Duel::new(water("p"), water("e"), &mut rng).unwrap();
        duel.play_turn(0, &mut rng).unwrap();
        duel.play_turn(1, &mut rng).unwrap();
        assert_eq!(duel.damage_dealt(), 20);

        duel.set_hp(Side::Enemy, 500);
        assert_eq!(duel.damage_dealt(), 20);
        assert_eq!(duel.enemy().max_hp, 90);
        assert_eq!(duel.enemy().hp, 70);
    }

    #[test]
    fn empty_slot_is_refilled_without_resolving() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut duel = Duel::new(deck("p", 9), deck("e", 9), &mut rng).unwrap();
        let lost = duel.player.hand[1].take().unwrap();
        duel.player.discard_pile.push(lost);
        let hp = duel.enemy().hp;

        assert_eq!(duel.play_turn(1, &mut rng).unwrap(), TurnOutcome::Refilled);
        assert_eq!(duel.turn(), 0);
        assert_eq!(duel.enemy().hp, hp);
        assert!(duel.player().hand()[1].is_some());
        assert_conserved(&duel);

        assert!(matches!(duel.play_turn(1, &mut rng).unwrap(), TurnOutcome::Resolved(_)));
    }

    #[test]
    fn invalid_slot_is_rejected() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut duel = Duel::new(deck("p", 9), deck("e", 9), &mut rng).unwrap();
        assert_eq!(duel.play_turn(3, &mut rng).unwrap_err(), DuelError::InvalidSlot { slot: 3 });
    }

    #[test]
    fn log_is_bounded() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut duel = Duel::new(deck("p", 9), deck("e", 9), &mut rng)
            .unwrap()
            .with_log_capacity(4);
        duel.set_hp(Side::Player, 100_000);
        duel.set_hp(Side::Enemy, 100_000);
        for t in 0..10 {
            duel.play_turn(t % HAND_SIZE, &mut rng).unwrap();
        }
        let turns: Vec<u32> = duel.log().map(|r| r.turn).collect();
        assert_eq!(turns, vec![6, 7, 8, 9]);
    }

    #[test]
    fn same_seed_same_duel() {
        let play = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut duel = Duel::new(deck("p", 9), deck("e", 9), &mut rng).unwrap();
            let mut t = 0;
            while !duel.is_finished() {
                duel.play_turn(t % HAND_SIZE, &mut rng).unwrap();
                t += 1;
            }
            (duel.result(), duel.turn(), duel.player().hp, duel.enemy().hp)
        };
        assert_eq!(play(123), play(123));
    }
}
