//! Adapter from loosely shaped upstream card records to `Card`.
//!
//! Upstream decks come from several storage generations and use different
//! field names. Everything inside the engine works on `Card` only.

use serde_json::Value;

use crate::engine::models::{Card, Element, DECK_SIZE};

/// Element used when a record has no recognizable element.
pub const FALLBACK_ELEMENT: Element = Element::Earth;

fn first_field<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find(|v| !v.is_null())
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Normalize a single record. Returns `None` only for non-object input.
pub fn normalize_card(raw: &Value, fallback_uid: &str) -> Option<Card> {
    if !raw.is_object() {
        return None;
    }

    let element = first_field(raw, &["element", "elem", "type"])
        .and_then(Value::as_str)
        .and_then(Element::parse_loose)
        .unwrap_or(FALLBACK_ELEMENT);

    let power = first_field(raw, &["power", "basePower", "str", "attack", "value"])
        .and_then(as_number)
        .map(|p| p.round())
        .filter(|p| *p >= 1.0)
        .map(|p| p.min(u32::MAX as f64) as u32)
        .unwrap_or(1);

    let id = first_field(raw, &["id", "cardId", "card_id"]).and_then(as_text);
    let uid = first_field(raw, &["uid"])
        .and_then(as_text)
        .or_else(|| id.clone())
        .unwrap_or_else(|| fallback_uid.to_string());
    let name = first_field(raw, &["name", "title"])
        .and_then(as_text)
        .unwrap_or_else(|| element.as_str().to_string());

    Some(Card {
        uid,
        id,
        name,
        element,
        power,
    })
}

/// Normalize a deck: the first `DECK_SIZE` records, skipping non-objects.
///
/// Cards whose uid collides with an earlier card get a positional suffix so
/// draw avoidance can tell them apart.
pub fn normalize_deck(raw: &[Value], uid_prefix: &str) -> Vec<Card> {
    let mut cards: Vec<Card> = Vec::with_capacity(DECK_SIZE);
    for (i, rec) in raw.iter().take(DECK_SIZE).enumerate() {
        let fallback = format!("{uid_prefix}{i}");
        let Some(mut card) = normalize_card(rec, &fallback) else {
            tracing::debug!(index = i, "skipping non-object card record");
            continue;
        };
        if cards.iter().any(|c| c.uid == card.uid) {
            let base = card.uid.clone();
            let mut n = i;
            loop {
                let candidate = format!("{base}#{n}");
                if !cards.iter().any(|c| c.uid == candidate) {
                    card.uid = candidate;
                    break;
                }
                n += 1;
            }
        }
        cards.push(card);
    }
    cards
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_aliased_fields() {
        let raw = json!({"card_id": "elem_01", "elem": "Wind", "basePower": "12.6", "title": "Gale"});
        let card = normalize_card(&raw, "p0").unwrap();
        assert_eq!(card.id.as_deref(), Some("elem_01"));
        assert_eq!(card.uid, "elem_01");
        assert_eq!(card.element, Element::Air);
        assert_eq!(card.power, 13);
        assert_eq!(card.name, "Gale");
    }

    #[test]
    fn defaults_power_and_element() {
        let raw = json!({"element": "plasma"});
        let card = normalize_card(&raw, "e3").unwrap();
        assert_eq!(card.element, FALLBACK_ELEMENT);
        assert_eq!(card.power, 1);
        assert_eq!(card.uid, "e3");
        assert_eq!(card.name, "earth");
    }

    #[test]
    fn non_positive_power_becomes_one() {
        let raw = json!({"element": "fire", "power": -4});
        assert_eq!(normalize_card(&raw, "x").unwrap().power, 1);
    }

    #[test]
    fn rejects_non_objects() {
        assert!(normalize_card(&json!(null), "x").is_none());
        assert!(normalize_card(&json!("fire"), "x").is_none());
    }

    #[test]
    fn deck_takes_first_nine_and_dedups_uids() {
        let raw: Vec<Value> = (0..12)
            .map(|_| json!({"id": "same", "element": "water", "power": 3}))
            .collect();
        let deck = normalize_deck(&raw, "p");
        assert_eq!(deck.len(), DECK_SIZE);
        let mut uids: Vec<&str> = deck.iter().map(|c| c.uid.as_str()).collect();
        uids.sort();
        uids.dedup();
        assert_eq!(uids.len(), DECK_SIZE);
    }

    #[test]
    fn suffixed_uid_never_collides_with_a_literal_one() {
        let raw = vec![json!({"uid": "a#2"}), json!({"uid": "a"}), json!({"uid": "a"})];
        let deck = normalize_deck(&raw, "p");
        let uids: Vec<&str> = deck.iter().map(|c| c.uid.as_str()).collect();
        assert_eq!(uids, vec!["a#2", "a", "a#3"]);
    }
}
