//! Daily driver: ticks every eligible lord once per day and rolls pruning
//! totals into seasonal summaries.

use tracing::{debug, info};

use noble_core::eviction::PruneReport;
use noble_core::{ActorId, Society, World};

use crate::config::CampaignConfig;

/// Pruning totals for one season.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeasonSummary {
    /// Days covered.
    pub days: u32,
    /// Records removed by decay in agent ticks.
    pub decayed: usize,
    /// Records removed by maintenance passes.
    pub maintenance: PruneReport,
    /// Stories told.
    pub gossip_shared: usize,
}

impl SeasonSummary {
    /// Every record removed this season.
    #[must_use]
    pub fn total_pruned(&self) -> usize {
        self.decayed + self.maintenance.total()
    }
}

/// What one campaign day did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayReport {
    /// Lords whose tick ran.
    pub ticked: usize,
    /// Stories told.
    pub gossip_shared: usize,
    /// Records removed by decay.
    pub decayed: usize,
    /// Records removed by maintenance.
    pub maintenance: PruneReport,
    /// Set on the day a season closes.
    pub season: Option<SeasonSummary>,
}

/// Runs the society once per campaign day.
#[derive(Debug, Clone)]
pub struct DailyScheduler {
    season_days: u32,
    daily_maintenance: bool,
    current: SeasonSummary,
}

impl DailyScheduler {
    /// Scheduler driven by `config`.
    #[must_use]
    pub fn new(config: &CampaignConfig) -> Self {
        Self {
            season_days: config.season_days.max(1),
            daily_maintenance: config.daily_maintenance,
            current: SeasonSummary::default(),
        }
    }

    /// Totals for the season in progress.
    #[must_use]
    pub fn current_season(&self) -> &SeasonSummary {
        &self.current
    }

    /// Tick every living adult lord, then run maintenance if configured.
    pub fn run_day<W: World + ?Sized>(&mut self, society: &mut Society, world: &mut W) -> DayReport {
        let now = world.now();
        let lords: Vec<ActorId> = world
            .living_actors()
            .into_iter()
            .filter(|&actor| world.profile(actor).is_some_and(|p| p.can_gossip()))
            .collect();

        let mut report = DayReport::default();
        for actor in lords {
            if let Some(tick) = society.tick(actor, world) {
                report.ticked += 1;
                report.decayed += tick.pruned;
                if tick.gossip.hearing().is_some() {
                    report.gossip_shared += 1;
                }
            }
            if self.daily_maintenance {
                if let Some(pruned) = society.run_maintenance(actor, now) {
                    report.maintenance.absorb(pruned);
                }
            }
        }

        self.current.days += 1;
        self.current.decayed += report.decayed;
        self.current.gossip_shared += report.gossip_shared;
        self.current.maintenance.absorb(report.maintenance);
        debug!(
            %now,
            ticked = report.ticked,
            gossip = report.gossip_shared,
            decayed = report.decayed,
            maintenance = report.maintenance.total(),
            "Campaign day complete"
        );

        if self.current.days >= self.season_days {
            let season = std::mem::take(&mut self.current);
            info!(
                days = season.days,
                decayed = season.decayed,
                culled = season.maintenance.culled,
                tag_capped = season.maintenance.tag_capped,
                fifo_evicted = season.maintenance.fifo_evicted,
                gossip = season.gossip_shared,
                "Season summary"
            );
            report.season = Some(season);
        }
        report
    }
}
