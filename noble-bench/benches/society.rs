//! Noble Society Benchmark Suite
//!
//! Daily-tick performance targets:
//!   register_memory_single ............ < 5μs
//!   agent_tick_200_memories .......... < 100μs
//!   maintenance_pass_500_memories .... < 200μs
//!   ripple_pass_20_observers ......... < 50μs
//!   campaign_day_100_lords ........... < 10ms

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use noble_bench::{populated, seeded_society, society_clone};
use noble_campaign::{CampaignConfig, DailyScheduler};
use noble_core::{ActorId, GameTime, MemoryEvent, MemoryKind, RelationChange, World};

/// Benchmark: one registration with its belief copy.
fn bench_register_memory(c: &mut Criterion) {
    let (a, b) = (ActorId::new(), ActorId::new());
    c.bench_function("register_memory_single", |bench| {
        bench.iter_batched(
            seeded_society,
            |mut society| {
                let event = MemoryEvent::new(a, b, MemoryKind::Betrayal, -1.0).notes("broke the truce");
                black_box(society.register_memory(event, GameTime::ZERO));
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: one agent tick (gossip + decay + prune) with 200 memories.
fn bench_agent_tick(c: &mut Criterion) {
    let (society, world, ids) = populated(20, 200);
    c.bench_function("agent_tick_200_memories", |bench| {
        bench.iter_batched(
            || (society_clone(&society), world.clone()),
            |(mut society, mut world)| black_box(society.tick(ids[1], &mut world)),
            BatchSize::LargeInput,
        );
    });
}

/// Benchmark: maintenance (half-life, cull, tag caps, hard cap) over 500.
fn bench_maintenance(c: &mut Criterion) {
    let (society, world, ids) = populated(4, 500);
    let now = world.now();
    c.bench_function("maintenance_pass_500_memories", |bench| {
        bench.iter_batched(
            || society_clone(&society),
            |mut society| black_box(society.run_maintenance(ids[0], now)),
            BatchSize::LargeInput,
        );
    });
}

/// Benchmark: a ripple pass over a full clan and kingdom.
fn bench_ripple(c: &mut Criterion) {
    let (society, world, ids) = populated(40, 0);
    let change = RelationChange::new(ids[1], ids[2], 25);
    c.bench_function("ripple_pass_20_observers", |bench| {
        bench.iter_batched(
            || world.clone(),
            |mut world| black_box(society.apply_ripples(&mut world, &change)),
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: a whole campaign day for 100 lords.
fn bench_campaign_day(c: &mut Criterion) {
    let (society, world, _) = populated(100, 50);
    let config = CampaignConfig::default();
    c.bench_function("campaign_day_100_lords", |bench| {
        bench.iter_batched(
            || (society_clone(&society), world.clone(), DailyScheduler::new(&config)),
            |(mut society, mut world, mut scheduler)| black_box(scheduler.run_day(&mut society, &mut world)),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_register_memory,
    bench_agent_tick,
    bench_maintenance,
    bench_ripple,
    bench_campaign_day,
);
criterion_main!(benches);
