//! # noble-campaign: Campaign-Map Integration for Noble Society
//!
//! Glue between a campaign host and the game-agnostic `noble-core`
//! simulation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                Campaign host                │
//! │  battles, sieges, tournaments, daily clock  │
//! │        │                        │           │
//! │        ▼                        ▼           │
//! │  ┌───────────┐          ┌──────────────┐    │
//! │  │   hooks   │          │  scheduler   │    │
//! │  └─────┬─────┘          └──────┬───────┘    │
//! │        │    ListeningWorld     │            │
//! │        ▼  (relation → ripple)  ▼            │
//! │  ┌──────────────────────────────────────┐   │
//! │  │              noble-core              │   │
//! │  └──────────────────────────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: campaign settings wrapping the core `SocietyConfig`
//! - `events`: campaign events that create memories
//! - `hooks`: per-event memory registration and relation changes
//! - `listener`: world wrapper that ripples material relation changes
//! - `scheduler`: daily ticks, maintenance and season summaries
//! - `telemetry`: tracing subscriber setup

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod events;
pub mod hooks;
pub mod listener;
pub mod scheduler;
pub mod telemetry;

pub use config::CampaignConfig;
pub use events::CampaignEvent;
pub use hooks::{HookOutcome, on_event};
pub use listener::ListeningWorld;
pub use scheduler::{DailyScheduler, DayReport, SeasonSummary};
