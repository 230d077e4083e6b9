//! Per-actor memory state and the registry that owns it.
//!
//! An [`AgentState`] is created lazily the first time an actor is referenced
//! and is never destroyed: actors that leave the world simply stop being
//! ticked. The [`AgentRegistry`] is an explicit owned object; there is no
//! global instance.

use std::collections::BTreeMap;

use tracing::trace;

use crate::config::DecayRates;
use crate::decay;
use crate::memory::{MemoryKind, MemoryRecord, MemoryTag};
use crate::types::{ActorId, GameTime, TraitSnapshot};

// ---------------------------------------------------------------------------
// AgentState
// ---------------------------------------------------------------------------

/// One actor's memories plus tick bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentState {
    actor: ActorId,
    /// Append order is chronological.
    memories: Vec<MemoryRecord>,
    last_tick: Option<GameTime>,
    last_decay: Option<GameTime>,
}

impl AgentState {
    /// Create an empty agent for `actor`.
    #[must_use]
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            memories: Vec::new(),
            last_tick: None,
            last_decay: None,
        }
    }

    /// The actor this state belongs to.
    #[must_use]
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// All records, oldest first.
    #[must_use]
    pub fn memories(&self) -> &[MemoryRecord] {
        &self.memories
    }

    /// Mutable access to the record list (maintenance and restore).
    pub fn memories_mut(&mut self) -> &mut Vec<MemoryRecord> {
        &mut self.memories
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.memories.len()
    }

    /// Whether the agent holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    /// Append a record.
    pub fn push(&mut self, record: MemoryRecord) {
        self.memories.push(record);
    }

    /// Records whose weight has not collapsed.
    pub fn live_memories(&self) -> impl Iterator<Item = &MemoryRecord> {
        self.memories.iter().filter(|m| m.is_live())
    }

    /// Whether any record is still live.
    #[must_use]
    pub fn has_live_memory(&self) -> bool {
        self.memories.iter().any(MemoryRecord::is_live)
    }

    /// A record with the same kind, subject and description as `record`.
    #[must_use]
    pub fn find_same_account(&self, record: &MemoryRecord) -> Option<&MemoryRecord> {
        self.memories.iter().find(|m| m.is_same_account(record))
    }

    /// The hearsay copy of `relayed`, if this actor has heard it before.
    pub fn find_rumour_mut(&mut self, relayed: &MemoryRecord) -> Option<&mut MemoryRecord> {
        self.memories.iter_mut().find(|m| m.is_rumour_of(relayed))
    }

    /// Records of one kind.
    pub fn of_kind(&self, kind: MemoryKind) -> impl Iterator<Item = &MemoryRecord> {
        self.memories.iter().filter(move |m| m.kind == kind)
    }

    /// Records carrying `tag`.
    pub fn tagged(&self, tag: MemoryTag) -> impl Iterator<Item = &MemoryRecord> {
        self.memories.iter().filter(move |m| m.has_tag(tag))
    }

    // ------------------------------------------------------------------
    // Tick bookkeeping
    // ------------------------------------------------------------------

    /// When the agent was last ticked.
    #[must_use]
    pub fn last_tick(&self) -> Option<GameTime> {
        self.last_tick
    }

    /// When the maintenance pass last ran.
    #[must_use]
    pub fn last_decay(&self) -> Option<GameTime> {
        self.last_decay
    }

    /// Whether a full simulated day has passed since the last tick.
    #[must_use]
    pub fn should_tick(&self, now: GameTime) -> bool {
        self.last_tick.is_none_or(|last| now.days_since(last) >= 1.0)
    }

    /// Stamp the tick time.
    pub fn mark_ticked(&mut self, now: GameTime) {
        self.last_tick = Some(now);
    }

    /// Stamp the maintenance time.
    pub fn mark_decayed(&mut self, now: GameTime) {
        self.last_decay = Some(now);
    }

    /// Restore bookkeeping from a saved snapshot.
    pub(crate) fn set_bookkeeping(&mut self, last_tick: Option<GameTime>, last_decay: Option<GameTime>) {
        self.last_tick = last_tick;
        self.last_decay = last_decay;
    }

    /// One day of linear decay followed by the daily prune, scaled by the
    /// owner's personality. Returns the number of records removed.
    pub fn decay_and_prune(&mut self, traits: &TraitSnapshot, now: GameTime) -> usize {
        let modifier = decay::decay_modifier(traits);
        let removed = decay::decay_and_prune(&mut self.memories, now, modifier);
        if removed > 0 {
            trace!(actor = %self.actor, removed, remaining = self.memories.len(), "Pruned memories");
        }
        removed
    }
}

// ---------------------------------------------------------------------------
// MemoryEvent
// ---------------------------------------------------------------------------

/// A world event to be remembered by its `source`.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryEvent {
    /// The actor who remembers.
    pub source: ActorId,
    /// The actor the memory is about.
    pub target: ActorId,
    /// What happened.
    pub kind: MemoryKind,
    /// Signed salience.
    pub weight: f32,
    /// Free-text description.
    pub notes: String,
    /// Optional classification tag.
    pub tag: Option<MemoryTag>,
    /// Also store a first-hand belief copy.
    pub first_hand_belief: bool,
}

impl MemoryEvent {
    /// A first-hand event with no notes or tag.
    #[must_use]
    pub fn new(source: ActorId, target: ActorId, kind: MemoryKind, weight: f32) -> Self {
        Self {
            source,
            target,
            kind,
            weight,
            notes: String::new(),
            tag: None,
            first_hand_belief: true,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Attach a classification tag.
    #[must_use]
    pub fn tag(mut self, tag: MemoryTag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Skip the first-hand belief copy.
    #[must_use]
    pub fn without_belief(mut self) -> Self {
        self.first_hand_belief = false;
        self
    }
}

// ---------------------------------------------------------------------------
// AgentRegistry
// ---------------------------------------------------------------------------

/// Identity → agent map with get-or-create semantics and no eviction.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: BTreeMap<ActorId, AgentState>,
}

impl AgentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The agent for `actor`, created on first reference.
    pub fn get_or_create(&mut self, actor: ActorId) -> &mut AgentState {
        self.agents.entry(actor).or_insert_with(|| AgentState::new(actor))
    }

    /// The agent for `actor`, if one exists.
    #[must_use]
    pub fn get(&self, actor: ActorId) -> Option<&AgentState> {
        self.agents.get(&actor)
    }

    /// Mutable agent for `actor`, if one exists.
    pub fn get_mut(&mut self, actor: ActorId) -> Option<&mut AgentState> {
        self.agents.get_mut(&actor)
    }

    /// Replace (or insert) an agent wholesale.
    pub fn insert(&mut self, agent: AgentState) {
        self.agents.insert(agent.actor(), agent);
    }

    /// Number of agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no agent exists yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Iterate agents in id order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentState> {
        self.agents.values()
    }

    /// Total records held across all agents.
    #[must_use]
    pub fn total_memories(&self) -> usize {
        self.agents.values().map(AgentState::len).sum()
    }

    /// Append the memory described by `event` to its source's agent.
    ///
    /// With `first_hand_belief` set, a second record with identical content
    /// tagged [`MemoryTag::Belief`] is appended as well. Returns the number
    /// of records added.
    pub fn register_memory(&mut self, event: MemoryEvent, now: GameTime, rates: &DecayRates) -> usize {
        let MemoryEvent {
            source,
            target,
            kind,
            weight,
            notes,
            tag,
            first_hand_belief,
        } = event;

        let agent = self.get_or_create(source);
        let mut record = MemoryRecord::with_rates(kind, source, target, weight, notes, now, rates);
        if let Some(tag) = tag {
            record.add_tag(tag);
        }

        let belief = first_hand_belief.then(|| {
            let mut copy = record.clone();
            copy.tags = vec![MemoryTag::Belief];
            copy
        });

        agent.push(record);
        let mut added = 1;
        if let Some(copy) = belief {
            agent.push(copy);
            added += 1;
        }

        trace!(%source, %target, %kind, weight, added, "Registered memory");
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_idempotent() {
        let mut registry = AgentRegistry::new();
        let actor = ActorId::new();
        registry.get_or_create(actor).push(MemoryRecord::new(
            MemoryKind::Insult,
            actor,
            actor,
            0.5,
            "",
            GameTime::ZERO,
        ));
        assert_eq!(registry.get_or_create(actor).len(), 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(ActorId::new()).is_none());
    }

    #[test]
    fn register_adds_belief_copy() {
        let mut registry = AgentRegistry::new();
        let (x, y) = (ActorId::new(), ActorId::new());
        let event = MemoryEvent::new(x, y, MemoryKind::BattleVictory, 1.0)
            .notes("won at the ford")
            .tag(MemoryTag::BattleVictory);

        let added = registry.register_memory(event, GameTime::ZERO, &DecayRates::default());
        assert_eq!(added, 2);

        let agent = registry.get(x).expect("agent created");
        let memories = agent.memories();
        assert_eq!(memories[0].tags, vec![MemoryTag::BattleVictory]);
        assert_eq!(memories[1].tags, vec![MemoryTag::Belief]);
        assert_eq!(memories[0].notes, memories[1].notes);
        assert_eq!(memories[1].kind, MemoryKind::BattleVictory);
        assert!(registry.get(y).is_none(), "target gets no agent");
    }

    #[test]
    fn register_without_belief() {
        let mut registry = AgentRegistry::new();
        let (x, y) = (ActorId::new(), ActorId::new());
        let event = MemoryEvent::new(x, y, MemoryKind::Insult, -0.4).without_belief();
        assert_eq!(registry.register_memory(event, GameTime::ZERO, &DecayRates::default()), 1);
        assert_eq!(registry.total_memories(), 1);
    }

    #[test]
    fn tick_gate_is_daily() {
        let mut agent = AgentState::new(ActorId::new());
        let t0 = GameTime::from_days(3.0);
        assert!(agent.should_tick(t0));
        agent.mark_ticked(t0);
        assert!(!agent.should_tick(t0));
        assert!(!agent.should_tick(t0.plus_days(0.9)));
        assert!(agent.should_tick(t0.plus_days(1.0)));
    }

    #[test]
    fn decay_and_prune_uses_owner_traits() {
        let mut agent = AgentState::new(ActorId::new());
        let other = ActorId::new();
        agent.push(MemoryRecord::new(MemoryKind::Insult, other, other, 0.035, "", GameTime::ZERO));

        let plain = TraitSnapshot::default();
        let merciful = TraitSnapshot { mercy: 2, ..TraitSnapshot::default() };

        let mut a = agent.clone();
        assert_eq!(a.decay_and_prune(&plain, GameTime::from_days(1.0)), 0);
        assert!((a.memories()[0].weight - 0.005).abs() < 1e-6);

        // 0.03 × 1.25 = 0.0375 wipes it out.
        assert_eq!(agent.decay_and_prune(&merciful, GameTime::from_days(1.0)), 1);
        assert!(agent.is_empty());
    }
}
