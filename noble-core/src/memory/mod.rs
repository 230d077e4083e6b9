//! Memory records, kinds and tags.
//!
//! [`MemoryRecord`] is the unit every other module works on; [`MemoryKind`]
//! carries the per-kind rule table; [`MemoryTag`] drives retention caps and
//! gossip filtering.

pub mod kind;
pub mod record;

pub use kind::{Affinity, DecayClass, KindProfile, MemoryKind};
pub use record::MemoryRecord;

use serde::{Deserialize, Serialize};

/// Classification label on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MemoryTag {
    /// Heard from someone else.
    Gossip,
    /// About a battle won.
    BattleVictory,
    /// About a battle lost.
    BattleDefeat,
    /// About a betrayal.
    Betrayal,
    /// Political matters.
    Political,
    /// Mistreatment by one's liege.
    LiegeMistreatment,
    /// Trade agreements.
    TradeAgreement,
    /// Held as established fact.
    Belief,
}
