//! Gossip: memory selection, diffusion, belief formation and the
//! rate-limited relationship consequences of hearing a story.
//!
//! One [`GossipEngine::try_gossip`] call is one speaker's attempt for the day:
//!
//! ```text
//! speaker eligible? ─▶ nearby listeners ─▶ pick memory ─▶ pick listener
//!        │                                                    │
//!        ▼                                                    ▼
//!   pair cooldown ─▶ already known? ─▶ first hearing / repeat + belief
//!                                                    │
//!                                                    ▼
//!                              consequence rules ─▶ rate limiter ─▶ World
//! ```

pub mod belief;
pub mod log;
pub mod rate_limit;
pub mod rules;

pub use belief::{BELIEF_THRESHOLD, BeliefInputs, belief_score, should_promote};
pub use log::{GossipEvent, GossipLog};
pub use rate_limit::{RateLimitOutcome, RateLimiter};
pub use rules::{ConsequenceRule, Recipient, rules_for};

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, debug_span, trace};

use crate::agent::{AgentRegistry, AgentState};
use crate::config::{DecayRates, GossipConfig};
use crate::decay;
use crate::memory::{MemoryKind, MemoryRecord, MemoryTag};
use crate::metrics::{SocietyCounters, spans};
use crate::types::{ActorId, ActorPair, GameTime, TraitSnapshot};
use crate::world::World;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a gossip attempt stopped before reaching a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The speaker holds no live memory.
    NoLiveMemory,
    /// The speaker is dead, underage, not a lord, or unknown.
    SpeakerIneligible,
    /// Nobody suitable nearby.
    NoListeners,
    /// No memory qualified for sharing.
    NothingToShare,
    /// This pair already talked within the cooldown.
    PairCoolingDown,
    /// The listener already holds this exact account.
    AlreadyKnown,
}

/// One relation change requested by a consequence rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationEffect {
    /// Whose relation changes toward whom: the listener toward this actor.
    pub toward: ActorId,
    /// Rule reason key.
    pub reason: &'static str,
    /// What the limiter decided.
    pub outcome: RateLimitOutcome,
}

/// A gossip exchange that reached a listener.
#[derive(Debug, Clone, PartialEq)]
pub struct Hearing {
    /// Who told it.
    pub speaker: ActorId,
    /// Who heard it.
    pub listener: ActorId,
    /// Underlying kind of the shared memory.
    pub kind: MemoryKind,
    /// Whether this was the first time the listener heard it.
    pub first_hearing: bool,
    /// Listener's repeat count after this hearing.
    pub repeat_count: u32,
    /// Whether this hearing promoted the rumour to a belief.
    pub belief_promoted: bool,
    /// Consequence rules that fired.
    pub effects: Vec<RelationEffect>,
}

/// Result of one gossip attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum GossipOutcome {
    /// Nothing was told.
    Skipped(SkipReason),
    /// A story was told.
    Shared(Hearing),
}

impl GossipOutcome {
    /// The hearing, if one happened.
    #[must_use]
    pub fn hearing(&self) -> Option<&Hearing> {
        match self {
            Self::Shared(h) => Some(h),
            Self::Skipped(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Selection helpers
// ---------------------------------------------------------------------------

/// Gossip-worthiness of a record for a speaker.
///
/// `weight × affinity(speaker, kind) / (age_days + 1)`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn share_score(record: &MemoryRecord, speaker: &TraitSnapshot, now: GameTime) -> f32 {
    let affinity = record.effective_kind().trait_affinity(speaker);
    record.weight * affinity / (record.age_days(now) as f32 + 1.0)
}

/// The speaker's best memory to share, if any.
///
/// Candidates are live, not expired, and not already common knowledge.
/// Ties keep list order.
#[must_use]
pub fn select_memory<'a>(
    agent: &'a AgentState,
    speaker: &TraitSnapshot,
    now: GameTime,
) -> Option<&'a MemoryRecord> {
    let modifier = decay::decay_modifier(speaker);
    let mut best: Option<(OrderedFloat<f32>, &MemoryRecord)> = None;
    for record in agent.live_memories() {
        if decay::is_expired(record, now, modifier) || record.is_established_gossip() {
            continue;
        }
        let score = OrderedFloat(share_score(record, speaker, now));
        if best.is_none_or(|(top, _)| score.cmp(&top) == Ordering::Greater) {
            best = Some((score, record));
        }
    }
    best.map(|(_, record)| record)
}

/// Lords the speaker could talk to right now.
///
/// In a settlement: everyone there. Otherwise the leaders of the speaker's
/// army, or failing that the speaker's own party.
pub fn nearby_nobles<W: World + ?Sized>(world: &W, speaker: ActorId) -> Vec<ActorId> {
    let candidates = if let Some(settlement) = world.current_settlement(speaker) {
        world.settlement_heroes(settlement)
    } else {
        let army = world.army_leaders(speaker);
        if army.is_empty() { world.party_heroes(speaker) } else { army }
    };

    candidates
        .into_iter()
        .filter(|&id| id != speaker)
        .filter(|&id| world.profile(id).is_some_and(|p| p.can_gossip()))
        .collect()
}

// ---------------------------------------------------------------------------
// GossipEngine
// ---------------------------------------------------------------------------

/// Owns the gossip ledgers, the RNG and the observability log.
#[derive(Debug)]
pub struct GossipEngine {
    config: GossipConfig,
    rates: DecayRates,
    rng: StdRng,
    last_interaction: HashMap<ActorPair, GameTime>,
    ledgers_pruned_at: Option<GameTime>,
    limiter: RateLimiter,
    log: GossipLog,
    counters: Arc<SocietyCounters>,
}

impl GossipEngine {
    /// Create an engine. A configured seed makes runs reproducible.
    #[must_use]
    pub fn new(config: GossipConfig, rates: DecayRates, counters: Arc<SocietyCounters>) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let limiter = RateLimiter::new(config.same_reason_cooldown_days, config.weekly_pair_delta_cap);
        Self {
            config,
            rates,
            rng,
            last_interaction: HashMap::new(),
            ledgers_pruned_at: None,
            limiter,
            log: GossipLog::new(),
            counters,
        }
    }

    /// The gossip log.
    #[must_use]
    pub fn log(&self) -> &GossipLog {
        &self.log
    }

    /// The rate limiter (for inspection).
    #[must_use]
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// When this unordered pair last exchanged gossip.
    #[must_use]
    pub fn last_interaction(&self, a: ActorId, b: ActorId) -> Option<GameTime> {
        self.last_interaction.get(&ActorPair::unordered(a, b)).copied()
    }

    /// Unordered pairs still inside the interaction cooldown.
    #[must_use]
    pub fn tracked_pairs(&self) -> usize {
        self.last_interaction.len()
    }

    /// Drop lapsed pair cooldowns and limiter entries, at most once a day.
    fn prune_ledgers(&mut self, now: GameTime) {
        if self
            .ledgers_pruned_at
            .is_some_and(|at| now.days_since(at) < 1.0)
        {
            return;
        }
        let cooldown = self.config.pair_cooldown_days;
        let before = self.last_interaction.len();
        self.last_interaction
            .retain(|_, last| now.days_since(*last) < cooldown);
        let dropped = before - self.last_interaction.len() + self.limiter.prune(now);
        self.ledgers_pruned_at = Some(now);
        if dropped > 0 {
            trace!(dropped, "Gossip ledgers pruned");
        }
    }

    /// One gossip attempt by `speaker`.
    pub fn try_gossip<W: World + ?Sized>(
        &mut self,
        registry: &mut AgentRegistry,
        speaker: ActorId,
        world: &mut W,
    ) -> GossipOutcome {
        let _span = debug_span!(spans::GOSSIP, %speaker).entered();
        let outcome = self.attempt(registry, speaker, world);
        match &outcome {
            GossipOutcome::Skipped(reason) => {
                trace!(%speaker, ?reason, "Gossip skipped");
                SocietyCounters::bump(&self.counters.gossip_skipped);
            }
            GossipOutcome::Shared(hearing) => {
                debug!(
                    %speaker,
                    listener = %hearing.listener,
                    kind = %hearing.kind,
                    first = hearing.first_hearing,
                    repeats = hearing.repeat_count,
                    believed = hearing.belief_promoted,
                    effects = hearing.effects.len(),
                    "Gossip shared"
                );
                SocietyCounters::bump(&self.counters.gossip_exchanges);
            }
        }
        outcome
    }

    fn attempt<W: World + ?Sized>(
        &mut self,
        registry: &mut AgentRegistry,
        speaker: ActorId,
        world: &mut W,
    ) -> GossipOutcome {
        let now = world.now();
        self.log.prune(now, self.config.log_lifespan_days);
        self.prune_ledgers(now);

        let Some(speaker_agent) = registry.get(speaker) else {
            return GossipOutcome::Skipped(SkipReason::NoLiveMemory);
        };
        if !speaker_agent.has_live_memory() {
            return GossipOutcome::Skipped(SkipReason::NoLiveMemory);
        }
        if !world.profile(speaker).is_some_and(|p| p.can_gossip()) {
            return GossipOutcome::Skipped(SkipReason::SpeakerIneligible);
        }

        let pool = nearby_nobles(world, speaker);
        if pool.is_empty() {
            return GossipOutcome::Skipped(SkipReason::NoListeners);
        }

        let speaker_traits = world.traits(speaker);
        let Some(memory) = select_memory(speaker_agent, &speaker_traits, now).cloned() else {
            return GossipOutcome::Skipped(SkipReason::NothingToShare);
        };
        let Some(&listener) = pool.choose(&mut self.rng) else {
            return GossipOutcome::Skipped(SkipReason::NoListeners);
        };

        if self
            .last_interaction(speaker, listener)
            .is_some_and(|last| now.days_since(last) < self.config.pair_cooldown_days)
        {
            return GossipOutcome::Skipped(SkipReason::PairCoolingDown);
        }

        let listener_agent = registry.get_or_create(listener);
        if listener_agent.find_same_account(&memory).is_some() {
            return GossipOutcome::Skipped(SkipReason::AlreadyKnown);
        }

        self.log.push(GossipEvent {
            speaker,
            listener,
            subject: memory.target,
            topic: memory.kind.name().to_owned(),
            message: memory.notes.clone(),
            location: world.current_settlement(speaker),
            timestamp: now,
        });

        let kind = memory.effective_kind();
        let mut hearing = Hearing {
            speaker,
            listener,
            kind,
            first_hearing: false,
            repeat_count: 1,
            belief_promoted: false,
            effects: Vec::new(),
        };

        if let Some(rumour) = listener_agent.find_rumour_mut(&memory) {
            rumour.repeat_count = (rumour.repeat_count + 1).min(self.config.max_repeat_count);
            rumour.weight += self.config.repeat_weight_bump;
            hearing.repeat_count = rumour.repeat_count;

            let inputs = BeliefInputs {
                trust: world.relation(speaker, listener),
                listener: world.traits(listener),
                kind,
                about_own_clan: world
                    .clan_of(listener)
                    .is_some_and(|clan| world.clan_of(memory.target) == Some(clan)),
            };
            let score = belief_score(&inputs);
            if should_promote(hearing.repeat_count, score) {
                let belief = MemoryRecord::with_rates(
                    kind,
                    speaker,
                    memory.target,
                    memory.weight * 0.5,
                    memory.notes.clone(),
                    now,
                    &self.rates,
                );
                listener_agent.push(belief);
                hearing.belief_promoted = true;
                SocietyCounters::bump(&self.counters.beliefs_promoted);
                debug!(%listener, %kind, score, "Rumour promoted to belief");
            } else {
                trace!(%listener, %kind, score, repeats = hearing.repeat_count, "Rumour not believed");
            }
        } else {
            let mut heard = MemoryRecord::with_rates(
                MemoryKind::GossipHeard,
                speaker,
                memory.target,
                self.config.first_hearing_weight,
                memory.notes.clone(),
                now,
                &self.rates,
            )
            .tagged(MemoryTag::Gossip);
            heard.original_kind = Some(kind);
            listener_agent.push(heard);
            hearing.first_hearing = true;
        }

        if !self.config.require_belief_for_relation || hearing.belief_promoted {
            hearing.effects = self.apply_consequences(world, &memory, speaker, listener, now);
        }

        self.last_interaction.insert(ActorPair::unordered(speaker, listener), now);
        GossipOutcome::Shared(hearing)
    }

    fn apply_consequences<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        memory: &MemoryRecord,
        speaker: ActorId,
        listener: ActorId,
        now: GameTime,
    ) -> Vec<RelationEffect> {
        let traits = world.traits(listener);
        let mut effects = Vec::new();

        for rule in rules_for(memory.effective_kind()) {
            if !rule.fires(&traits, &mut self.rng) {
                continue;
            }
            let toward = match rule.recipient {
                Recipient::MemorySource => memory.source,
                Recipient::Speaker => speaker,
            };
            let outcome = self.limiter.admit(listener, toward, rule.delta, rule.reason, now);
            match outcome {
                RateLimitOutcome::Applied(_) => {
                    SocietyCounters::bump(&self.counters.relation_deltas_applied);
                }
                RateLimitOutcome::Clipped { .. } => {
                    SocietyCounters::bump(&self.counters.relation_deltas_clipped);
                }
                RateLimitOutcome::CoolingDown | RateLimitOutcome::BudgetExhausted => {
                    SocietyCounters::bump(&self.counters.relation_deltas_suppressed);
                }
                RateLimitOutcome::Ignored => {}
            }
            if let Some(delta) = outcome.granted() {
                world.apply_relation_delta(listener, toward, delta, true);
            }
            effects.push(RelationEffect {
                toward,
                reason: rule.reason,
                outcome,
            });
        }
        effects
    }
}
