//! Core combat data types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of hand slots per side.
pub const HAND_SIZE: usize = 3;

/// Maximum number of cards a side brings into a duel.
pub const DECK_SIZE: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Water,
    Air,
    Earth,
}

impl Element {
    pub const ALL: [Element; 4] = [Element::Fire, Element::Water, Element::Air, Element::Earth];

    /// Row/column index into the multiplier table.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Element::Fire => 0,
            Element::Water => 1,
            Element::Air => 2,
            Element::Earth => 3,
        }
    }

    /// Parse a loosely spelled element name. `wind` is an alias for air.
    pub fn parse_loose(raw: &str) -> Option<Element> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fire" => Some(Element::Fire),
            "water" => Some(Element::Water),
            "air" | "wind" => Some(Element::Air),
            "earth" => Some(Element::Earth),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Element::Fire => "fire",
            Element::Water => "water",
            Element::Air => "air",
            Element::Earth => "earth",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A card as the combat engine sees it. Power never changes during a duel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Unique within one side's deck.
    pub uid: String,
    /// Catalog id, when the card came from the catalog.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub element: Element,
    pub power: u32,
}

impl Card {
    pub fn new(uid: impl Into<String>, element: Element, power: u32) -> Self {
        Self {
            uid: uid.into(),
            id: None,
            name: element.as_str().to_string(),
            element,
            power,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Player,
    Enemy,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player => f.write_str("player"),
            Side::Enemy => f.write_str("enemy"),
        }
    }
}

/// Terminal result of a duel, from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuelOutcome {
    Win,
    #[serde(alias = "loss")]
    Lose,
    Draw,
}

impl DuelOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            DuelOutcome::Win => "win",
            DuelOutcome::Lose => "lose",
            DuelOutcome::Draw => "draw",
        }
    }
}

impl fmt::Display for DuelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DuelOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "win" => Ok(DuelOutcome::Win),
            "lose" | "loss" => Ok(DuelOutcome::Lose),
            "draw" => Ok(DuelOutcome::Draw),
            other => Err(format!("unknown duel result: {other}")),
        }
    }
}

/// One card's appearance in a turn record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayedCard {
    pub uid: String,
    pub id: Option<String>,
    pub name: String,
    pub element: Element,
    pub power: u32,
}

impl From<&Card> for PlayedCard {
    fn from(card: &Card) -> Self {
        Self {
            uid: card.uid.clone(),
            id: card.id.clone(),
            name: card.name.clone(),
            element: card.element,
            power: card.power,
        }
    }
}

/// Display-only record of one resolved turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn: u32,
    pub slot: usize,
    pub player_card: PlayedCard,
    pub enemy_card: PlayedCard,
    /// Damage dealt by the player's card to the enemy.
    pub player_damage: u32,
    pub player_multiplier: f64,
    /// Damage dealt by the enemy's card to the player.
    pub enemy_damage: u32,
    pub enemy_multiplier: f64,
}
