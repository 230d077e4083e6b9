//! Fixtures shared by the benchmark suite.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]

use noble_core::config::SocietyConfig;
use noble_core::world::SandboxWorld;
use noble_core::{ActorId, GameTime, MemoryEvent, MemoryKind, MemoryTag, SettlementId, Society, TraitSnapshot};

const KINDS: [MemoryKind; 6] = [
    MemoryKind::Insult,
    MemoryKind::TradeDeal,
    MemoryKind::MilitaryAid,
    MemoryKind::BattleVictory,
    MemoryKind::Betrayal,
    MemoryKind::MinorFavor,
];

/// A society with a fixed gossip seed.
#[must_use]
pub fn seeded_society() -> Society {
    let mut config = SocietyConfig::default();
    config.gossip.rng_seed = Some(42);
    Society::new(config)
}

/// Deterministic spread of trait levels in `-2..=2`.
#[must_use]
pub fn traits_for(i: usize) -> TraitSnapshot {
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    let level = |shift: usize| ((i >> shift) % 5) as i32 - 2;
    TraitSnapshot {
        valor: level(0),
        mercy: level(1),
        honor: level(2),
        generosity: level(3),
        calculating: level(4),
    }
}

/// `lords` nobles spread over a handful of towns and clans, each holding
/// `memories` records about their neighbours.
#[must_use]
pub fn populated(lords: usize, memories: usize) -> (Society, SandboxWorld, Vec<ActorId>) {
    let mut society = seeded_society();
    let mut world = SandboxWorld::new();
    let towns: Vec<SettlementId> = (0..5).map(|_| SettlementId::new()).collect();
    let king = world.add_lord(traits_for(0));
    let kingdom = world.add_kingdom(Some(king));
    let clans: Vec<_> = (0..8).map(|_| world.add_clan(Some(kingdom))).collect();

    let mut ids = vec![king];
    for i in 1..lords {
        ids.push(world.add_lord(traits_for(i)));
    }
    for (i, &id) in ids.iter().enumerate() {
        world.place(id, Some(towns[i % towns.len()]));
        world.join_clan(id, clans[i % clans.len()]);
    }

    for (i, &source) in ids.iter().enumerate() {
        for m in 0..memories {
            let target = ids[(i + m + 1) % ids.len()];
            #[allow(clippy::cast_precision_loss)]
            let weight = 0.3 + (m % 7) as f32 * 0.1;
            #[allow(clippy::cast_precision_loss)]
            let day = (m % 30) as f64;
            let mut event = MemoryEvent::new(source, target, KINDS[m % KINDS.len()], weight)
                .notes(format!("event {m}"))
                .without_belief();
            if m % 4 == 0 {
                event = event.tag(MemoryTag::Gossip);
            }
            society.register_memory(event, GameTime::from_days(day));
        }
    }
    world.set_now(GameTime::from_days(30.0));
    (society, world, ids)
}

/// A fresh society holding the same agents.
#[must_use]
pub fn society_clone(society: &Society) -> Society {
    let mut copy = Society::new(society.config().clone());
    for agent in society.registry().iter() {
        copy.registry_mut().insert(agent.clone());
    }
    copy
}
