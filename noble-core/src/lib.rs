//! # Noble Society Core
//!
//! Game-agnostic social memory for a population of nobles.
//!
//! Every actor gets an [`AgentState`] holding weighted, decaying
//! [`MemoryRecord`]s. Once a day each actor may share one memory with a
//! nearby noble:
//!
//! - **Decay**: weights drift toward zero at a per-kind rate scaled by the
//!   owner's personality; defining events are never forgotten.
//! - **Gossip**: rumours spread, repeat, and become beliefs once trusted.
//! - **Consequences**: hearing a story nudges relations, through a weekly
//!   per-pair budget.
//! - **Ripples**: a material relation change spreads, attenuated, to
//!   family, clan, friends and kingdom.
//!
//! The host supplies a [`World`] (relations, traits, who is where); the
//! [`Society`] facade owns everything else.
//!
//! ## Performance Contract
//!
//! All operations are synchronous and sized for a daily campaign tick:
//! - Memory registration: O(1)
//! - Agent tick (gossip + decay + prune): O(memories + nearby nobles)
//! - Ripple pass: at most `max_observers` relation writes

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod agent;
pub mod config;
pub mod decay;
pub mod error;
pub mod eviction;
pub mod gossip;
pub mod memory;
pub mod metrics;
pub mod persistence;
pub mod ripple;
pub mod society;
pub mod types;
pub mod world;

pub use agent::{AgentRegistry, AgentState, MemoryEvent};
pub use config::SocietyConfig;
pub use error::SocietyError;
pub use memory::{MemoryKind, MemoryRecord, MemoryTag};
pub use ripple::{RelationChange, RelationChangeDetail, RippleService};
pub use society::{Society, TickReport};
pub use types::*;
pub use world::World;
