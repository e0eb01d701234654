//! End-to-end flow: play a duel, apply it through a file-backed account,
//! and check the daily gold window across a day change.
//!
//! Run with:
//!     cargo test --test progression_flow

use rand::rngs::StdRng;
use rand::SeedableRng;

use duel_progression::config::BalanceConfig;
use duel_progression::engine::duel::Duel;
use duel_progression::engine::models::{Card, DuelOutcome, Element};
use duel_progression::engine::simulator::simulate_duel;
use duel_progression::engine::strategy::GreedySlot;
use duel_progression::progression::{
    Account, AccountStore, BattlePayload, DayKey, FileStore, FixedClock, InMemoryStore, ProgressionService, Title,
};

fn deck(prefix: &str, element: Element, power: u32) -> Vec<Card> {
    (0..9).map(|i| Card::new(format!("{prefix}{i}"), element, power)).collect()
}

fn day(d: u32) -> DayKey {
    DayKey::from_ymd(2024, 6, d).unwrap()
}

#[test]
fn simulated_duel_commits_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("account.json");
    let store = FileStore::create_if_missing(&path, &Account::new("wren")).unwrap();
    let service = ProgressionService::new(store, FixedClock::new(day(1)), BalanceConfig::default());

    let mut rng = StdRng::seed_from_u64(11);
    let mut duel = Duel::new(deck("p", Element::Water, 10), deck("e", Element::Fire, 10), &mut rng).unwrap();
    simulate_duel(&mut duel, &GreedySlot, 500, &mut rng).unwrap();
    let payload = BattlePayload::from_duel(&duel, "Fire Imp").unwrap();
    assert_eq!(payload.result, DuelOutcome::Win);
    assert_eq!(payload.damage_dealt, 90);
    assert!(!payload.log.is_empty());

    let summary = service.apply_duel_result(&payload, &mut rng).unwrap();
    assert_eq!(summary.enemy_name, "Fire Imp");
    assert_eq!(summary.rating.after, 30);
    assert_eq!(summary.xp.gained, 90);
    assert_eq!(summary.rewards.duel_silver, 100);
    assert_eq!(summary.rewards.gold_limit, 1);

    let reopened = FileStore::new(&path).read_active().unwrap();
    assert_eq!(reopened.duel.rating, 30);
    assert_eq!(reopened.xp_total, 90);
    assert_eq!(reopened.silver, 100);
    assert_eq!(reopened.duel.wins, 1);
    assert_eq!(reopened.duel.daily_gold_date, Some(day(1)));
}

#[test]
fn unfinished_duel_has_no_payload() {
    let mut rng = StdRng::seed_from_u64(2);
    let duel = Duel::new(deck("p", Element::Air, 5), deck("e", Element::Earth, 5), &mut rng).unwrap();
    assert!(BattlePayload::from_duel(&duel, "nobody").is_none());
}

#[test]
fn day_change_resets_gold_window_once() {
    let store = InMemoryStore::with_account(Account::new("yara"));
    let service = ProgressionService::new(store, FixedClock::new(day(1)), BalanceConfig::default());
    let mut rng = StdRng::seed_from_u64(5);
    let lose = BattlePayload::new(DuelOutcome::Lose, 0);

    service
        .store()
        .mutate_active(&mut |acc| {
            acc.duel.daily_gold = 1;
            acc.duel.daily_gold_date = Some(day(1));
            acc.duel.gold_pity = 2;
            None
        })
        .unwrap();

    let summary = service.apply_duel_result(&lose, &mut rng).unwrap();
    assert_eq!(summary.rewards.gold_pity, 3);
    assert_eq!(summary.rewards.gold_today, 1);

    service.clock().advance_day();

    // Reading state shows the new window without persisting it.
    let state = service.progression_state().unwrap();
    assert_eq!(state.duel.daily_gold, 0);
    assert_eq!(state.duel.gold_pity, 0);
    assert_eq!(service.read_account().unwrap().duel.gold_pity, 3);

    let summary = service.apply_duel_result(&lose, &mut rng).unwrap();
    assert_eq!(summary.day, day(2));
    assert_eq!(summary.rewards.gold_today, 0);
    assert_eq!(summary.rewards.gold_pity, 1);

    let summary = service.apply_duel_result(&lose, &mut rng).unwrap();
    assert_eq!(summary.rewards.gold_pity, 2);
}

#[test]
fn settings_round_trip_through_service() {
    let service = ProgressionService::new(
        InMemoryStore::with_account(Account::new("zed")),
        FixedClock::new(day(3)),
        BalanceConfig::default(),
    );

    service.set_guild_level(4_000).unwrap();
    service.toggle_title(Title::TournamentChampion, true).unwrap();
    service.set_duel_league("league-blue-3").unwrap();
    service.set_duel_league("league-missing").unwrap();

    let state = service.progression_state().unwrap();
    assert_eq!(state.guild_level, 999);
    assert_eq!(state.titles, vec![Title::TournamentChampion]);
    assert_eq!(state.league.id, "league-blue-3");
    // Level 1 doubled by the tournament title.
    assert_eq!(state.duel.daily_gold_limit, 2);
}

#[test]
fn xp_reward_levels_and_pays_gold() {
    let service = ProgressionService::new(
        InMemoryStore::with_account(Account::new("abe")),
        FixedClock::new(day(4)),
        BalanceConfig::default(),
    );
    let summary = service.grant_xp_reward(740).unwrap();
    assert_eq!(summary.level_before, 1);
    assert_eq!(summary.level_after, 3);
    assert_eq!(summary.level_up_gold, 5);
    assert_eq!(service.read_account().unwrap().gold, 5);
}

#[test]
fn arena_opens_at_duel_rating_threshold() {
    let mut acc = Account::new("bex");
    acc.duel.rating = 2_000;
    let service = ProgressionService::new(InMemoryStore::with_account(acc), FixedClock::new(day(5)), BalanceConfig::default());
    let mut rng = StdRng::seed_from_u64(3);

    let entered = service.enter_arena().unwrap();
    let arena = entered.arena.unwrap();
    assert_eq!(arena.rating, 1_400);
    assert_eq!(arena.league_id, "arena-blue-3");

    let summary = service.apply_arena_result(DuelOutcome::Lose, &mut rng).unwrap();
    assert!((1_376..=1_385).contains(&summary.rating_after));
    assert_eq!(summary.silver, 0);
    assert_eq!(service.read_account().unwrap().arena.unwrap().losses, 1);
}
