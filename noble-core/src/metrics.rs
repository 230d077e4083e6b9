//! Runtime counters and tick timing.
//!
//! Counters are lock-free `AtomicU64`s incremented on the hot path and read
//! on export. Tick timings live in a `parking_lot::Mutex` ring buffer that is
//! only locked once per recorded tick and on the rare percentile query.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// Counters (lock-free)
// ---------------------------------------------------------------------------

/// Atomic counters for society events.
#[derive(Debug)]
pub struct SocietyCounters {
    /// Records appended by `register_memory` (belief copies included).
    pub memories_registered: AtomicU64,
    /// Gossip attempts that reached a listener.
    pub gossip_exchanges: AtomicU64,
    /// Gossip attempts that stopped early.
    pub gossip_skipped: AtomicU64,
    /// Rumours promoted to beliefs.
    pub beliefs_promoted: AtomicU64,
    /// Gossip relation deltas applied in full.
    pub relation_deltas_applied: AtomicU64,
    /// Gossip relation deltas clipped by the weekly budget.
    pub relation_deltas_clipped: AtomicU64,
    /// Gossip relation deltas dropped by cooldown or budget.
    pub relation_deltas_suppressed: AtomicU64,
    /// Secondary ripple deltas applied.
    pub ripples_applied: AtomicU64,
    /// Records removed by daily prune and maintenance.
    pub memories_pruned: AtomicU64,
    /// Agent ticks that ran (not gated).
    pub ticks_run: AtomicU64,
    /// Maintenance passes that ran.
    pub maintenance_passes: AtomicU64,
    /// Snapshots written to storage.
    pub saves_completed: AtomicU64,
}

impl SocietyCounters {
    /// Zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            memories_registered: AtomicU64::new(0),
            gossip_exchanges: AtomicU64::new(0),
            gossip_skipped: AtomicU64::new(0),
            beliefs_promoted: AtomicU64::new(0),
            relation_deltas_applied: AtomicU64::new(0),
            relation_deltas_clipped: AtomicU64::new(0),
            relation_deltas_suppressed: AtomicU64::new(0),
            ripples_applied: AtomicU64::new(0),
            memories_pruned: AtomicU64::new(0),
            ticks_run: AtomicU64::new(0),
            maintenance_passes: AtomicU64::new(0),
            saves_completed: AtomicU64::new(0),
        }
    }

    /// Add `n` to a counter.
    pub fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Increment a counter by one.
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            memories_registered: self.memories_registered.load(Ordering::Relaxed),
            gossip_exchanges: self.gossip_exchanges.load(Ordering::Relaxed),
            gossip_skipped: self.gossip_skipped.load(Ordering::Relaxed),
            beliefs_promoted: self.beliefs_promoted.load(Ordering::Relaxed),
            relation_deltas_applied: self.relation_deltas_applied.load(Ordering::Relaxed),
            relation_deltas_clipped: self.relation_deltas_clipped.load(Ordering::Relaxed),
            relation_deltas_suppressed: self.relation_deltas_suppressed.load(Ordering::Relaxed),
            ripples_applied: self.ripples_applied.load(Ordering::Relaxed),
            memories_pruned: self.memories_pruned.load(Ordering::Relaxed),
            ticks_run: self.ticks_run.load(Ordering::Relaxed),
            maintenance_passes: self.maintenance_passes.load(Ordering::Relaxed),
            saves_completed: self.saves_completed.load(Ordering::Relaxed),
        }
    }
}

impl Default for SocietyCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Records registered.
    pub memories_registered: u64,
    /// Gossip exchanges.
    pub gossip_exchanges: u64,
    /// Skipped gossip attempts.
    pub gossip_skipped: u64,
    /// Beliefs promoted.
    pub beliefs_promoted: u64,
    /// Full relation deltas.
    pub relation_deltas_applied: u64,
    /// Clipped relation deltas.
    pub relation_deltas_clipped: u64,
    /// Suppressed relation deltas.
    pub relation_deltas_suppressed: u64,
    /// Ripple deltas.
    pub ripples_applied: u64,
    /// Pruned records.
    pub memories_pruned: u64,
    /// Ticks run.
    pub ticks_run: u64,
    /// Maintenance passes.
    pub maintenance_passes: u64,
    /// Saves.
    pub saves_completed: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let rows: [(&str, &str, u64); 12] = [
            ("memories_registered", "Memory records registered", self.memories_registered),
            ("gossip_exchanges", "Gossip exchanges that reached a listener", self.gossip_exchanges),
            ("gossip_skipped", "Gossip attempts skipped", self.gossip_skipped),
            ("beliefs_promoted", "Rumours promoted to beliefs", self.beliefs_promoted),
            ("relation_deltas_applied", "Gossip relation deltas applied", self.relation_deltas_applied),
            ("relation_deltas_clipped", "Gossip relation deltas clipped", self.relation_deltas_clipped),
            (
                "relation_deltas_suppressed",
                "Gossip relation deltas suppressed",
                self.relation_deltas_suppressed,
            ),
            ("ripples_applied", "Ripple deltas applied", self.ripples_applied),
            ("memories_pruned", "Memory records pruned", self.memories_pruned),
            ("ticks_run", "Agent ticks run", self.ticks_run),
            ("maintenance_passes", "Maintenance passes run", self.maintenance_passes),
            ("saves_completed", "Snapshots saved", self.saves_completed),
        ];

        let mut out = String::new();
        for (name, help, value) in rows {
            out.push_str(&format!(
                "# HELP noble_{name}_total {help}\n\
                 # TYPE noble_{name}_total counter\n\
                 noble_{name}_total {value}\n"
            ));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tick timer
// ---------------------------------------------------------------------------

const HISTORY_LEN: usize = 256;

/// Tracks wall-clock time spent per scheduler tick.
#[derive(Debug)]
pub struct TickTimer {
    budget_ms: f64,
    history: Mutex<TickHistory>,
}

#[derive(Debug)]
struct TickHistory {
    timings: Vec<f64>,
    write_idx: usize,
    count: u64,
    last_over_budget: bool,
}

impl TickTimer {
    /// Create a timer with the given per-tick budget (milliseconds).
    #[must_use]
    pub fn new(budget_ms: f64) -> Self {
        Self {
            budget_ms,
            history: Mutex::new(TickHistory {
                timings: vec![0.0; HISTORY_LEN],
                write_idx: 0,
                count: 0,
                last_over_budget: false,
            }),
        }
    }

    /// Start timing; the guard records elapsed time on drop.
    pub fn start(&self) -> TickGuard<'_> {
        TickGuard {
            timer: self,
            start: Instant::now(),
        }
    }

    /// Record a timing (milliseconds).
    pub fn record(&self, ms: f64) {
        let mut h = self.history.lock();
        let idx = h.write_idx;
        h.timings[idx] = ms;
        h.write_idx = (idx + 1) % HISTORY_LEN;
        h.count += 1;
        h.last_over_budget = ms > self.budget_ms;
    }

    /// Number of ticks recorded.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.history.lock().count
    }

    /// Whether the most recent tick ran over budget.
    #[must_use]
    pub fn is_over_budget(&self) -> bool {
        self.history.lock().last_over_budget
    }

    /// P50 / P95 / max over the buffered history.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn percentiles(&self) -> TickPercentiles {
        let h = self.history.lock();
        let n = usize::try_from(h.count).unwrap_or(usize::MAX).min(HISTORY_LEN);
        if n == 0 {
            return TickPercentiles::default();
        }

        let mut sorted = h.timings[..n].to_vec();
        sorted.sort_by(f64::total_cmp);

        TickPercentiles {
            p50: sorted[n / 2],
            p95: sorted[((n as f64 * 0.95) as usize).min(n - 1)],
            max: sorted[n - 1],
        }
    }

    /// The configured budget in milliseconds.
    #[must_use]
    pub fn budget_ms(&self) -> f64 {
        self.budget_ms
    }
}

impl Default for TickTimer {
    fn default() -> Self {
        Self::new(2.0)
    }
}

/// RAII guard returned by [`TickTimer::start`].
pub struct TickGuard<'a> {
    timer: &'a TickTimer,
    start: Instant,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.timer.record(self.start.elapsed().as_secs_f64() * 1000.0);
    }
}

/// Percentile statistics for tick timings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickPercentiles {
    /// Median (ms).
    pub p50: f64,
    /// 95th percentile (ms).
    pub p95: f64,
    /// Slowest buffered tick (ms).
    pub max: f64,
}

// ---------------------------------------------------------------------------
// Tracing span names
// ---------------------------------------------------------------------------

/// Span names used with `tracing::span!`.
pub mod spans {
    /// One agent's daily tick.
    pub const TICK: &str = "noble::tick";
    /// A gossip attempt.
    pub const GOSSIP: &str = "noble::gossip";
    /// A ripple pass.
    pub const RIPPLE: &str = "noble::ripple";
    /// Maintenance pass.
    pub const MAINTENANCE: &str = "noble::maintenance";
    /// Persistence save.
    pub const PERSIST_SAVE: &str = "noble::persist::save";
    /// Persistence load.
    pub const PERSIST_LOAD: &str = "noble::persist::load";
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
