//! Integration hooks: campaign events → memories and relation changes.
//!
//! Each hook checks that the actors involved are lords, registers the
//! memories with their tuned weights, and applies any immediate relation
//! change through the [`World`] primitive. If the host's world forwards
//! relation changes into the ripple service (see [`crate::listener`]), the
//! siege penalty ripples like any other material change.

use tracing::debug;

use noble_core::world::World;
use noble_core::{ActorId, MemoryEvent, MemoryKind, MemoryTag, Society};

use crate::events::CampaignEvent;

const VICTORY_WEIGHT: f32 = 1.0;
const DEFEAT_WEIGHT: f32 = 0.8;
const SIEGE_OWNER_WEIGHT: f32 = 1.0;
const SIEGE_BESIEGER_WEIGHT: f32 = 0.8;
const SIEGE_RELATION_PENALTY: i32 = -30;
const SETTLEMENT_LOST_WEIGHT: f32 = 1.0;
const TOURNAMENT_BASE_WEIGHT: f32 = 0.8;
const TOURNAMENT_VALOR_WEIGHT: f32 = 0.25;
const TOURNAMENT_RELATION_SWING: i32 = 2;

/// What a hook did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookOutcome {
    /// Records added across all actors.
    pub memories: usize,
    /// Relation changes applied.
    pub relation_changes: usize,
}

/// Dispatch one event.
pub fn on_event<W: World + ?Sized>(society: &mut Society, world: &mut W, event: &CampaignEvent) -> HookOutcome {
    let outcome = match event {
        CampaignEvent::FieldBattleEnded { winners, losers } => on_field_battle(society, world, winners, losers),
        CampaignEvent::PrisonerTaken { captive, captor } => on_prisoner_taken(society, world, *captive, *captor),
        CampaignEvent::PrisonerReleased { captive, captor } => {
            on_prisoner_released(society, world, *captive, *captor)
        }
        CampaignEvent::SiegeStarted {
            owner,
            besieger,
            settlement,
        } => on_siege_started(society, world, *owner, *besieger, settlement),
        CampaignEvent::SettlementLost {
            old_owner,
            capturer,
            settlement,
            by_siege,
        } => on_settlement_lost(society, world, *old_owner, *capturer, settlement, *by_siege),
        CampaignEvent::TournamentFinished {
            winner,
            participants,
            town,
            player_participated,
        } => on_tournament_finished(society, world, *winner, participants, town, *player_participated),
    };
    debug!(
        event = event.label(),
        memories = outcome.memories,
        relation_changes = outcome.relation_changes,
        "Campaign event handled"
    );
    outcome
}

fn is_lord<W: World + ?Sized>(world: &W, actor: ActorId) -> bool {
    world.profile(actor).is_some_and(|p| p.lord)
}

fn distinct_lords<W: World + ?Sized>(world: &W, actors: &[ActorId]) -> Vec<ActorId> {
    let mut lords: Vec<ActorId> = Vec::with_capacity(actors.len());
    for &actor in actors {
        if is_lord(world, actor) && !lords.contains(&actor) {
            lords.push(actor);
        }
    }
    lords
}

/// Every winning lord remembers beating every losing lord, and vice versa.
pub fn on_field_battle<W: World + ?Sized>(
    society: &mut Society,
    world: &mut W,
    winners: &[ActorId],
    losers: &[ActorId],
) -> HookOutcome {
    let winners = distinct_lords(world, winners);
    let losers = distinct_lords(world, losers);
    let mut outcome = HookOutcome::default();
    if winners.is_empty() || losers.is_empty() {
        return outcome;
    }

    let now = world.now();
    for &winner in &winners {
        for &loser in &losers {
            let event = MemoryEvent::new(winner, loser, MemoryKind::BattleVictory, VICTORY_WEIGHT)
                .notes(format!("Defeated {loser} in battle"))
                .tag(MemoryTag::BattleVictory);
            outcome.memories += society.register_memory(event, now);
        }
    }
    for &loser in &losers {
        for &winner in &winners {
            let event = MemoryEvent::new(loser, winner, MemoryKind::BattleDefeat, DEFEAT_WEIGHT)
                .notes(format!("Defeated by {winner} in battle"))
                .tag(MemoryTag::BattleDefeat);
            outcome.memories += society.register_memory(event, now);
        }
    }
    outcome
}

/// The captive remembers their captor; brave captives feel it more.
pub fn on_prisoner_taken<W: World + ?Sized>(
    society: &mut Society,
    world: &mut W,
    captive: ActorId,
    captor: ActorId,
) -> HookOutcome {
    if !is_lord(world, captive) || !is_lord(world, captor) {
        return HookOutcome::default();
    }
    let weight = if world.traits(captive).valor >= 1 { 1.2 } else { 1.0 };
    let event = MemoryEvent::new(captive, captor, MemoryKind::Imprisoned, weight)
        .notes(format!("Taken prisoner by {captor}"));
    HookOutcome {
        memories: society.register_memory(event, world.now()),
        relation_changes: 0,
    }
}

/// The released lord remembers who let them go.
pub fn on_prisoner_released<W: World + ?Sized>(
    society: &mut Society,
    world: &mut W,
    captive: ActorId,
    captor: ActorId,
) -> HookOutcome {
    if !is_lord(world, captive) || !is_lord(world, captor) {
        return HookOutcome::default();
    }
    let weight = if world.traits(captive).valor >= 1 { 1.0 } else { 0.8 };
    let event = MemoryEvent::new(captive, captor, MemoryKind::ReleasedAfterBattle, weight)
        .notes(format!("Released after battle by {captor}"));
    HookOutcome {
        memories: society.register_memory(event, world.now()),
        relation_changes: 0,
    }
}

/// Both sides remember the siege and their relation drops at once.
pub fn on_siege_started<W: World + ?Sized>(
    society: &mut Society,
    world: &mut W,
    owner: ActorId,
    besieger: ActorId,
    settlement: &str,
) -> HookOutcome {
    if owner == besieger || !is_lord(world, owner) || !is_lord(world, besieger) {
        return HookOutcome::default();
    }
    let now = world.now();
    let mut outcome = HookOutcome::default();

    outcome.memories += society.register_memory(
        MemoryEvent::new(owner, besieger, MemoryKind::SiegeStarted, SIEGE_OWNER_WEIGHT)
            .notes(format!("Siege begun against {settlement} by {besieger}"))
            .tag(MemoryTag::Political),
        now,
    );
    outcome.memories += society.register_memory(
        MemoryEvent::new(besieger, owner, MemoryKind::SiegeStarted, SIEGE_BESIEGER_WEIGHT)
            .notes(format!("Laid siege to {settlement}, owned by {owner}"))
            .tag(MemoryTag::Political),
        now,
    );

    world.apply_relation_delta(owner, besieger, SIEGE_RELATION_PENALTY, true);
    outcome.relation_changes = 1;
    outcome
}

/// A lord who loses a town to a siege remembers who took it.
pub fn on_settlement_lost<W: World + ?Sized>(
    society: &mut Society,
    world: &mut W,
    old_owner: ActorId,
    capturer: ActorId,
    settlement: &str,
    by_siege: bool,
) -> HookOutcome {
    let alive_lord = world.profile(old_owner).is_some_and(|p| p.lord && p.alive);
    if !by_siege || !alive_lord {
        return HookOutcome::default();
    }
    let event = MemoryEvent::new(old_owner, capturer, MemoryKind::LostSettlement, SETTLEMENT_LOST_WEIGHT)
        .notes(format!("Lost {settlement} to {capturer}"))
        .tag(MemoryTag::Political);
    HookOutcome {
        memories: society.register_memory(event, world.now()),
        relation_changes: 0,
    }
}

/// The champion remembers the win. Unless the player fought, every other
/// lord's relation with the champion moves by ±2 according to whether their
/// virtues sum to a non-negative value.
pub fn on_tournament_finished<W: World + ?Sized>(
    society: &mut Society,
    world: &mut W,
    winner: ActorId,
    participants: &[ActorId],
    town: &str,
    player_participated: bool,
) -> HookOutcome {
    if !is_lord(world, winner) {
        return HookOutcome::default();
    }

    #[allow(clippy::cast_precision_loss)]
    let weight = TOURNAMENT_BASE_WEIGHT + world.traits(winner).valor as f32 * TOURNAMENT_VALOR_WEIGHT;
    let mut outcome = HookOutcome {
        memories: society.register_memory(
            MemoryEvent::new(winner, winner, MemoryKind::TournamentVictory, weight)
                .notes(format!("Won a tournament at {town}")),
            world.now(),
        ),
        relation_changes: 0,
    };
    if player_participated {
        return outcome;
    }

    for other in distinct_lords(world, participants) {
        if other == winner {
            continue;
        }
        let delta = if world.traits(other).virtue_sum() >= 0 {
            TOURNAMENT_RELATION_SWING
        } else {
            -TOURNAMENT_RELATION_SWING
        };
        world.apply_relation_delta(winner, other, delta, false);
        outcome.relation_changes += 1;
    }
    outcome
}
