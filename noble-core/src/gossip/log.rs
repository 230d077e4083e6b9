//! Rolling log of gossip exchanges, kept for observability only.

use std::collections::VecDeque;

use crate::types::{ActorId, GameTime, SettlementId};

/// One exchange between a speaker and a listener.
#[derive(Debug, Clone, PartialEq)]
pub struct GossipEvent {
    /// Who told it.
    pub speaker: ActorId,
    /// Who heard it.
    pub listener: ActorId,
    /// Who it was about.
    pub subject: ActorId,
    /// Kind name of the shared memory.
    pub topic: String,
    /// The memory's notes.
    pub message: String,
    /// Where the speaker was, if in a settlement.
    pub location: Option<SettlementId>,
    /// When it was told.
    pub timestamp: GameTime,
}

/// Chronological gossip history, pruned by age.
#[derive(Debug, Clone, Default)]
pub struct GossipLog {
    events: VecDeque<GossipEvent>,
}

impl GossipLog {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, event: GossipEvent) {
        self.events.push_back(event);
    }

    /// Drop events older than `lifespan_days`. Returns how many went.
    pub fn prune(&mut self, now: GameTime, lifespan_days: f64) -> usize {
        let before = self.events.len();
        self.events
            .retain(|e| now.days_since(e.timestamp) <= lifespan_days);
        before - self.events.len()
    }

    /// Events whose subject is `subject`.
    pub fn about(&self, subject: ActorId) -> impl Iterator<Item = &GossipEvent> {
        self.events.iter().filter(move |e| e.subject == subject)
    }

    /// Events at or after `since`.
    pub fn since(&self, since: GameTime) -> impl Iterator<Item = &GossipEvent> {
        self.events.iter().filter(move |e| e.timestamp >= since)
    }

    /// All events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &GossipEvent> {
        self.events.iter()
    }

    /// Number of events held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
