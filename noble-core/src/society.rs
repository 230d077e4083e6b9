//! The society: one owned object holding every agent plus the engines that
//! act on them.
//!
//! Hosts create one [`Society`] per campaign session and pass a [`World`]
//! into each call. Nothing here is global, so two sessions (or two tests)
//! never see each other's state.
//!
//! ```text
//!   host event ──▶ register_memory ──▶ AgentRegistry
//!   scheduler  ──▶ tick(actor)     ──▶ GossipEngine ──▶ World::apply_relation_delta
//!                                  ──▶ decay + prune          │
//!   host hook  ◀───────────────────────────────────────────────┘
//!        └──▶ on_relation_changed ──▶ RippleService ──▶ World (notify = false)
//! ```

use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, debug_span, info};

use crate::agent::{AgentRegistry, MemoryEvent};
use crate::config::SocietyConfig;
use crate::error::Result;
use crate::eviction::{self, PruneReport};
use crate::gossip::{GossipEngine, GossipEvent, GossipOutcome};
use crate::metrics::{CounterSnapshot, SocietyCounters, TickTimer, spans};
use crate::persistence::{MemorySnapshot, PersistenceEngine};
use crate::ripple::{AppliedRipple, RelationChange, RippleService};
use crate::types::{ActorId, GameTime};
use crate::world::World;

/// What one agent tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// The gossip attempt.
    pub gossip: GossipOutcome,
    /// Records removed by decay and expiry.
    pub pruned: usize,
}

/// Owns the registry, engines, counters and tick timer.
#[derive(Debug)]
pub struct Society {
    config: SocietyConfig,
    registry: AgentRegistry,
    gossip: GossipEngine,
    ripple: Rc<RippleService>,
    counters: Arc<SocietyCounters>,
    timer: TickTimer,
}

impl Society {
    /// Create an empty society.
    #[must_use]
    pub fn new(config: SocietyConfig) -> Self {
        let counters = Arc::new(SocietyCounters::new());
        let gossip = GossipEngine::new(
            config.gossip.clone(),
            config.memory.decay_rates,
            Arc::clone(&counters),
        );
        let ripple = Rc::new(RippleService::new(config.ripple.clone(), Arc::clone(&counters)));
        Self {
            config,
            registry: AgentRegistry::new(),
            gossip,
            ripple,
            counters,
            timer: TickTimer::default(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SocietyConfig {
        &self.config
    }

    /// All agents.
    #[must_use]
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// All agents, mutably.
    pub fn registry_mut(&mut self) -> &mut AgentRegistry {
        &mut self.registry
    }

    /// The gossip engine.
    #[must_use]
    pub fn gossip(&self) -> &GossipEngine {
        &self.gossip
    }

    /// A shared handle to the ripple service, for relation-change hooks
    /// that live inside the host's world.
    #[must_use]
    pub fn ripple_service(&self) -> Rc<RippleService> {
        Rc::clone(&self.ripple)
    }

    /// Shared counters.
    #[must_use]
    pub fn counters(&self) -> &Arc<SocietyCounters> {
        &self.counters
    }

    /// Point-in-time counter values.
    #[must_use]
    pub fn metrics(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Per-tick timings.
    #[must_use]
    pub fn tick_timer(&self) -> &TickTimer {
        &self.timer
    }

    // ------------------------------------------------------------------
    // Simulation
    // ------------------------------------------------------------------

    /// Record an event in its source's memory. Returns records added (zero
    /// when the simulation is disabled).
    pub fn register_memory(&mut self, event: MemoryEvent, now: GameTime) -> usize {
        if !self.config.general.enabled {
            return 0;
        }
        let (source, kind) = (event.source, event.kind);
        let added = self
            .registry
            .register_memory(event, now, &self.config.memory.decay_rates);
        SocietyCounters::add(&self.counters.memories_registered, added);
        debug!(%source, %kind, added, "Memory registered");
        added
    }

    /// Daily tick for one actor: gossip, decay, prune, stamp.
    ///
    /// Returns `None` without doing anything if the actor already ticked
    /// within the last day, is unknown to `world`, or the simulation is
    /// disabled.
    pub fn tick<W: World + ?Sized>(&mut self, actor: ActorId, world: &mut W) -> Option<TickReport> {
        if !self.config.general.enabled || world.profile(actor).is_none() {
            return None;
        }
        let now = world.now();
        if !self.registry.get_or_create(actor).should_tick(now) {
            return None;
        }

        let _span = debug_span!(spans::TICK, %actor).entered();
        let _timing = self.timer.start();

        let gossip = self.gossip.try_gossip(&mut self.registry, actor, world);

        let traits = world.traits(actor);
        let agent = self.registry.get_or_create(actor);
        let pruned = agent.decay_and_prune(&traits, now);
        agent.mark_ticked(now);

        SocietyCounters::bump(&self.counters.ticks_run);
        SocietyCounters::add(&self.counters.memories_pruned, pruned);
        Some(TickReport { gossip, pruned })
    }

    /// Run the daily maintenance pass for one actor. `None` if it already
    /// ran within the last day or the actor has no memories yet.
    pub fn run_maintenance(&mut self, actor: ActorId, now: GameTime) -> Option<PruneReport> {
        let agent = self.registry.get_mut(actor)?;
        let _span = debug_span!(spans::MAINTENANCE, %actor).entered();
        let report = eviction::run_maintenance(agent, now, &self.config.memory)?;

        SocietyCounters::bump(&self.counters.maintenance_passes);
        SocietyCounters::add(&self.counters.memories_pruned, report.total());
        Some(report)
    }

    /// Ripple `change` out to the observers around both parties.
    pub fn apply_ripples<W: World + ?Sized>(&self, world: &mut W, change: &RelationChange) -> Vec<AppliedRipple> {
        self.ripple.apply_ripples(world, change)
    }

    /// Relationship-change hook; only material changes ripple.
    pub fn on_relation_changed<W: World + ?Sized>(
        &self,
        world: &mut W,
        change: &RelationChange,
    ) -> Vec<AppliedRipple> {
        self.ripple.on_relation_changed(world, change)
    }

    // ------------------------------------------------------------------
    // Gossip log
    // ------------------------------------------------------------------

    /// Logged gossip whose subject is `subject`.
    pub fn gossip_about(&self, subject: ActorId) -> impl Iterator<Item = &GossipEvent> {
        self.gossip.log().about(subject)
    }

    /// Logged gossip at or after `since`.
    pub fn recent_gossip(&self, since: GameTime) -> impl Iterator<Item = &GossipEvent> {
        self.gossip.log().since(since)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Flatten one actor's state. `None` for actors never seen.
    #[must_use]
    pub fn snapshot(&self, actor: ActorId) -> Option<MemorySnapshot> {
        self.registry.get(actor).map(MemorySnapshot::from_agent)
    }

    /// Replace one actor's state with `snapshot`.
    ///
    /// # Errors
    /// Returns [`crate::SocietyError::SnapshotShape`] if the snapshot's
    /// lists disagree; the existing state is left untouched.
    pub fn restore(&mut self, actor: ActorId, snapshot: MemorySnapshot) -> Result<()> {
        let agent = snapshot.into_agent(actor)?;
        self.registry.insert(agent);
        Ok(())
    }

    /// Save every agent, then rotate the on-disk backups. Returns the
    /// number saved.
    ///
    /// # Errors
    /// Propagates storage failures; nothing is committed if the save itself
    /// fails.
    pub fn save(&self, engine: &PersistenceEngine) -> Result<usize> {
        let saved = engine.save_registry(&self.registry)?;
        engine.create_rotating_backup()?;
        SocietyCounters::bump(&self.counters.saves_completed);
        Ok(saved)
    }

    /// Replace every agent with what `engine` holds. Returns the number
    /// loaded.
    ///
    /// # Errors
    /// Propagates storage failures; the current registry is kept on error.
    pub fn load(&mut self, engine: &PersistenceEngine) -> Result<usize> {
        self.registry = engine.load_registry()?;
        info!(agents = self.registry.len(), "Society restored");
        Ok(self.registry.len())
    }
}

impl Default for Society {
    fn default() -> Self {
        Self::new(SocietyConfig::default())
    }
}
