//! Element multiplier table and per-exchange damage.

use crate::engine::models::{Card, Element};

/// Attacker row, defender column, indexed by `Element::index`
/// (fire, water, air, earth).
pub const ELEMENT_MULTIPLIERS: [[f64; 4]; 4] = [
    // fire
    [1.0, 0.5, 1.5, 1.0],
    // water
    [1.5, 1.0, 0.5, 0.5],
    // air
    [0.5, 1.0, 1.0, 1.5],
    // earth
    [1.0, 1.5, 0.5, 1.0],
];

#[inline]
pub fn multiplier(attacker: Element, defender: Element) -> f64 {
    ELEMENT_MULTIPLIERS[attacker.index()][defender.index()]
}

/// Damage `attacker` deals to `defender`. Returns (damage, multiplier).
pub fn damage(attacker: &Card, defender: &Card) -> (u32, f64) {
    let mult = multiplier(attacker.element, defender.element);
    let dmg = (attacker.power as f64 * mult).round() as u32;
    (dmg, mult)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Element::*;

    #[test]
    fn all_16_element_pairs() {
        assert_eq!(multiplier(Fire, Fire), 1.0);
        assert_eq!(multiplier(Fire, Water), 0.5);
        assert_eq!(multiplier(Fire, Air), 1.5);
        assert_eq!(multiplier(Fire, Earth), 1.0);

        assert_eq!(multiplier(Water, Fire), 1.5);
        assert_eq!(multiplier(Water, Water), 1.0);
        assert_eq!(multiplier(Water, Air), 0.5);
        assert_eq!(multiplier(Water, Earth), 0.5);

        assert_eq!(multiplier(Air, Fire), 0.5);
        assert_eq!(multiplier(Air, Water), 1.0);
        assert_eq!(multiplier(Air, Air), 1.0);
        assert_eq!(multiplier(Air, Earth), 1.5);

        assert_eq!(multiplier(Earth, Fire), 1.0);
        assert_eq!(multiplier(Earth, Water), 1.5);
        assert_eq!(multiplier(Earth, Air), 0.5);
        assert_eq!(multiplier(Earth, Earth), 1.0);
    }

    #[test]
    fn same_element_is_neutral() {
        for e in Element::ALL {
            assert_eq!(multiplier(e, e), 1.0);
        }
    }

    #[test]
    fn fire_into_water_halves() {
        let fire = Card::new("f", Fire, 12);
        let water = Card::new("w", Water, 12);
        assert_eq!(damage(&fire, &water), (6, 0.5));
    }

    #[test]
    fn advantage_rounds_half_up() {
        let water = Card::new("w", Water, 7);
        let fire = Card::new("f", Fire, 1);
        // 7 * 1.5 = 10.5
        assert_eq!(damage(&water, &fire), (11, 1.5));
    }

    #[test]
    fn disadvantage_rounds_half_up() {
        let air = Card::new("a", Air, 5);
        let fire = Card::new("f", Fire, 1);
        // 5 * 0.5 = 2.5
        assert_eq!(damage(&air, &fire).0, 3);
    }
}
