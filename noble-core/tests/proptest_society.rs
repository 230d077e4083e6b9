//! Property-Based Tests for the Noble Society Core
//!
//! Uses `proptest` to check the decay, retention, rate-limit and ripple
//! invariants under random inputs.

use std::sync::Arc;

use proptest::prelude::*;

use noble_core::config::RippleConfig;
use noble_core::decay;
use noble_core::eviction;
use noble_core::gossip::RateLimiter;
use noble_core::metrics::SocietyCounters;
use noble_core::ripple::{RelationChange, RippleService};
use noble_core::world::SandboxWorld;
use noble_core::{ActorId, GameTime, MemoryKind, MemoryRecord, MemoryTag, TraitSnapshot};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_traits() -> impl Strategy<Value = TraitSnapshot> {
    (-3..=3i32, -3..=3i32, -3..=3i32, -3..=3i32, -3..=3i32).prop_map(
        |(valor, mercy, honor, generosity, calculating)| TraitSnapshot {
            valor,
            mercy,
            honor,
            generosity,
            calculating,
        },
    )
}

fn record_at(kind: MemoryKind, weight: f32, day: f64, note: usize) -> MemoryRecord {
    MemoryRecord::new(
        kind,
        ActorId::new(),
        ActorId::new(),
        weight,
        format!("event {note}"),
        GameTime::from_days(day),
    )
}

// ---------------------------------------------------------------------------
// Decay
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn decay_is_monotone_and_snaps_to_zero(
        weight in prop_oneof![-2.0..-0.01f32, 0.01..2.0f32],
        rate in 0.001..0.2f32,
        traits in arb_traits(),
        days in 1..120usize,
    ) {
        let modifier = decay::decay_modifier(&traits);
        let mut record = record_at(MemoryKind::Insult, weight, 0.0, 0);
        record.decay_rate = rate;

        let mut previous = record.weight.abs();
        for _ in 0..days {
            decay::decay_weight(&mut record, modifier);
            let current = record.weight.abs();
            prop_assert!(current <= previous);
            prop_assert!(current == 0.0 || current >= decay::PRUNE_EPSILON);
            prop_assert!(record.weight == 0.0 || record.weight.signum() == weight.signum());
            previous = current;
        }
    }
}

proptest! {
    #[test]
    fn never_forget_records_hold_their_weight(
        weight in -2.0..2.0f32,
        traits in arb_traits(),
        days in 1..1000u32,
    ) {
        let modifier = decay::decay_modifier(&traits);
        let mut record = record_at(MemoryKind::Murder, weight, 0.0, 0);
        prop_assert!(record.never_forget);

        for _ in 0..days {
            decay::decay_weight(&mut record, modifier);
        }
        prop_assert_eq!(record.weight, weight);
        prop_assert!(!decay::is_expired(&record, GameTime::from_days(f64::from(days)), modifier));
    }
}

// ---------------------------------------------------------------------------
// Retention caps
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn hard_cap_evicts_oldest_first(count in 0..400usize, cap in 1..300usize) {
        let mut memories: Vec<_> = (0..count)
            .map(|i| {
                let mut r = record_at(MemoryKind::Betrayal, 1.0, 0.0, i);
                r.never_forget = i % 2 == 0;
                r
            })
            .collect();

        let evicted = eviction::enforce_hard_cap(&mut memories, cap);
        prop_assert_eq!(evicted, count.saturating_sub(cap));
        prop_assert_eq!(memories.len(), count.min(cap));
        if let Some(first) = memories.first() {
            prop_assert_eq!(&first.notes, &format!("event {}", count - memories.len()));
        }
    }
}

proptest! {
    #[test]
    fn tag_cap_drops_exactly_the_oldest_excess(
        days in Just((0..120u32).collect::<Vec<_>>()).prop_shuffle(),
        tagged_every in 1..4usize,
        cap in 0..80usize,
    ) {
        let mut memories: Vec<_> = days
            .iter()
            .enumerate()
            .map(|(i, &day)| {
                let r = record_at(MemoryKind::GossipHeard, 0.5, f64::from(day), i);
                if i % tagged_every == 0 { r.tagged(MemoryTag::Gossip) } else { r }
            })
            .collect();
        let tagged_before: Vec<u64> = memories
            .iter()
            .filter(|m| m.has_tag(MemoryTag::Gossip))
            .map(|m| m.timestamp.tick)
            .collect();
        let untagged_before = memories.len() - tagged_before.len();

        let removed = eviction::enforce_tag_cap(&mut memories, MemoryTag::Gossip, cap);
        prop_assert_eq!(removed, tagged_before.len().saturating_sub(cap));
        prop_assert_eq!(memories.iter().filter(|m| !m.has_tag(MemoryTag::Gossip)).count(), untagged_before);

        let mut newest = tagged_before.clone();
        newest.sort_unstable();
        let kept_floor = newest.len().saturating_sub(cap);
        let mut survivors: Vec<u64> = memories
            .iter()
            .filter(|m| m.has_tag(MemoryTag::Gossip))
            .map(|m| m.timestamp.tick)
            .collect();
        survivors.sort_unstable();
        prop_assert_eq!(survivors, newest[kept_floor..].to_vec());
    }
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn weekly_cap_clips_and_never_overspends(
        requests in prop::collection::vec((-5..=5i32, 0.0..0.5f64), 1..14),
        cap in 1..8u32,
    ) {
        let mut limiter = RateLimiter::new(5.0, cap);
        let (listener, actor) = (ActorId::new(), ActorId::new());
        let budget = i32::try_from(cap).unwrap_or(i32::MAX);

        let mut now = GameTime::ZERO;
        let mut spent = 0;
        for (i, (delta, step)) in requests.into_iter().enumerate() {
            now = now.plus_days(step);
            let outcome = limiter.admit(listener, actor, delta, &format!("reason {i}"), now);
            let remaining = budget - spent;

            match outcome.granted() {
                Some(granted) => {
                    prop_assert_eq!(granted.signum(), delta.signum());
                    prop_assert_eq!(granted.abs(), delta.abs().min(remaining));
                    spent += granted.abs();
                }
                None => prop_assert!(delta == 0 || remaining == 0),
            }
            prop_assert!(spent <= budget);
            prop_assert_eq!(limiter.spent_this_week(listener, actor, now), spent);
        }
    }
}

// ---------------------------------------------------------------------------
// Ripples
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn ripples_stay_within_cap_and_follow_the_primary_sign(
        base in prop_oneof![-100..=-10i32, 10..=100i32],
        observer_traits in prop::collection::vec(arb_traits(), 1..6),
        relations in prop::collection::vec(-100..=100i32, 6),
    ) {
        let mut world = SandboxWorld::new();
        let a = world.add_lord(TraitSnapshot::default());
        let b = world.add_lord(TraitSnapshot::default());
        let kingdom = world.add_kingdom(Some(a));
        let clan = world.add_clan(Some(kingdom));
        world.join_clan(b, clan);

        let target = if base >= 0 { b } else { a };
        for (i, traits) in observer_traits.into_iter().enumerate() {
            let observer = world.add_lord(traits);
            world.join_clan(observer, clan);
            world.set_relation(observer, target, relations[i]);
        }

        let service = RippleService::new(RippleConfig::default(), Arc::new(SocietyCounters::new()));
        let applied = service.apply_ripples(&mut world, &RelationChange::new(a, b, base));

        for ripple in &applied {
            prop_assert!(ripple.delta != 0 && ripple.delta.abs() <= 5);
            prop_assert_eq!(ripple.delta.signum(), base.signum());
            prop_assert_eq!(ripple.target, target);
        }
        prop_assert_eq!(world.relation_calls().len(), applied.len());
        prop_assert!(world.relation_calls().iter().all(|call| !call.notify));
    }
}
