//! Criterion benchmarks for duel resolution and the reward pipeline.
//!
//! Run with:
//!     cargo bench --bench duel_resolution

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use duel_progression::config::BalanceConfig;
use duel_progression::engine::duel::Duel;
use duel_progression::engine::models::{Card, DuelOutcome, Element};
use duel_progression::engine::simulator::simulate_duel;
use duel_progression::engine::strategy::{GreedySlot, RandomSlot, SlotStrategy};
use duel_progression::progression::clock::DayKey;
use duel_progression::progression::pipeline::{apply_battle, BattlePayload};
use duel_progression::progression::rewards::CollectionFlags;
use duel_progression::progression::Account;

fn mixed_deck(prefix: &str, offset: usize) -> Vec<Card> {
    (0..9)
        .map(|i| {
            let element = Element::ALL[(i + offset) % Element::ALL.len()];
            Card::new(format!("{prefix}{i}"), element, 6 + (i as u32 * 3) % 11)
        })
        .collect()
}

fn bench_simulate_duel(c: &mut Criterion) {
    let player = mixed_deck("p", 0);
    let enemy = mixed_deck("e", 1);
    let strategies: Vec<Box<dyn SlotStrategy>> = vec![Box::new(RandomSlot), Box::new(GreedySlot)];

    let mut group = c.benchmark_group("simulate_duel");
    for strategy in &strategies {
        group.bench_with_input(BenchmarkId::new("strategy", strategy.name()), strategy, |b, s| {
            let mut seed = 0u64;
            b.iter(|| {
                seed += 1;
                let mut rng = StdRng::seed_from_u64(seed);
                let mut duel = Duel::new(player.clone(), enemy.clone(), &mut rng).unwrap();
                simulate_duel(&mut duel, s.as_ref(), 500, &mut rng).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_apply_battle(c: &mut Criterion) {
    let rules = BalanceConfig::default();
    let flags = CollectionFlags::default();
    let today = DayKey::from_ymd(2024, 1, 1).unwrap();

    let mut group = c.benchmark_group("apply_battle");
    for result in [DuelOutcome::Win, DuelOutcome::Lose] {
        let payload = BattlePayload::new(result, 1_000);
        group.bench_with_input(BenchmarkId::new("result", result), &payload, |b, p| {
            let mut rng = StdRng::seed_from_u64(7);
            let mut acc = Account::new("bench");
            acc.duel.rating = 2_500;
            b.iter(|| apply_battle(&mut acc, p, &flags, &rules, today, &mut rng));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_simulate_duel, bench_apply_battle);
criterion_main!(benches);
