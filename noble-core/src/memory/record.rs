//! A single actor's recollection of an event.
//!
//! The shape of a record is fixed at construction; only its weight, its
//! repeat count and its tags change afterwards.

use serde::{Deserialize, Serialize};

use super::{MemoryKind, MemoryTag};
use crate::config::DecayRates;
use crate::decay::PRUNE_EPSILON;
use crate::types::{ActorId, GameTime};

/// One remembered event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// What happened.
    pub kind: MemoryKind,
    /// For relayed rumours: the kind of the underlying event.
    pub original_kind: Option<MemoryKind>,
    /// Who the memory came from (the actor who experienced or told it).
    pub source: ActorId,
    /// Who the memory is about. May equal `source`.
    pub target: ActorId,
    /// When the record was created.
    pub timestamp: GameTime,
    /// Signed salience: sign is valence, magnitude is importance.
    pub weight: f32,
    /// Weight lost per day at decay modifier 1.0.
    pub decay_rate: f32,
    /// Exempt from decay and expiry.
    pub never_forget: bool,
    /// How many times this rumour has been heard (starts at 1).
    pub repeat_count: u32,
    /// Classification labels.
    pub tags: Vec<MemoryTag>,
    /// Free-text description; doubles as the rumour de-duplication key.
    pub notes: String,
}

impl MemoryRecord {
    /// Create a record with the reference decay rates.
    #[must_use]
    pub fn new(
        kind: MemoryKind,
        source: ActorId,
        target: ActorId,
        weight: f32,
        notes: impl Into<String>,
        timestamp: GameTime,
    ) -> Self {
        Self::with_rates(kind, source, target, weight, notes, timestamp, &DecayRates::default())
    }

    /// Create a record, assigning its decay behaviour from `rates` by kind.
    #[must_use]
    pub fn with_rates(
        kind: MemoryKind,
        source: ActorId,
        target: ActorId,
        weight: f32,
        notes: impl Into<String>,
        timestamp: GameTime,
        rates: &DecayRates,
    ) -> Self {
        let decay = kind.profile().decay;
        Self {
            kind,
            original_kind: None,
            source,
            target,
            timestamp,
            weight,
            decay_rate: decay.rate(rates),
            never_forget: matches!(decay, super::DecayClass::NeverForget),
            repeat_count: 1,
            tags: Vec::new(),
            notes: notes.into(),
        }
    }

    /// Builder-style tag.
    #[must_use]
    pub fn tagged(mut self, tag: MemoryTag) -> Self {
        self.add_tag(tag);
        self
    }

    /// Add a tag if not already present.
    pub fn add_tag(&mut self, tag: MemoryTag) {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Whether the record carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: MemoryTag) -> bool {
        self.tags.contains(&tag)
    }

    /// Whether the weight is still meaningful.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.weight.abs() >= PRUNE_EPSILON
    }

    /// Days since creation.
    #[must_use]
    pub fn age_days(&self, now: GameTime) -> f64 {
        now.days_since(self.timestamp)
    }

    /// The kind of the underlying event (unwraps relayed rumours).
    #[must_use]
    pub fn effective_kind(&self) -> MemoryKind {
        self.original_kind.unwrap_or(self.kind)
    }

    /// Same kind, same subject, same description.
    #[must_use]
    pub fn is_same_account(&self, other: &Self) -> bool {
        self.kind == other.kind && self.target == other.target && self.notes == other.notes
    }

    /// A rumour that has been heard often enough to count as common knowledge.
    #[must_use]
    pub fn is_established_gossip(&self) -> bool {
        self.kind == MemoryKind::GossipHeard
            && self.repeat_count >= 3
            && self.has_tag(MemoryTag::Gossip)
    }

    /// Whether this is the hearsay copy of `relayed` (matched by underlying
    /// kind, description and subject).
    #[must_use]
    pub fn is_rumour_of(&self, relayed: &Self) -> bool {
        self.kind == MemoryKind::GossipHeard
            && (self.original_kind == Some(relayed.kind) || self.kind == relayed.kind)
            && self.notes == relayed.notes
            && self.target == relayed.target
    }
}
