//! The daily maintenance pass: half-life decay, cull, tag caps, hard cap.
//!
//! Runs separately from the agent tick and is owned by the scheduler.
//!
//! ```text
//! ┌────────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐
//! │ half-life  │────▶│   cull   │────▶│ tag caps │────▶│ hard cap │
//! │ 0.5^(d/27) │     │ |w|<0.20 │     │ oldest   │     │   FIFO   │
//! └────────────┘     └──────────┘     └──────────┘     └──────────┘
//! ```
//!
//! The first two steps leave `never_forget` records alone. The hard cap
//! does not: it evicts by creation order regardless of tag, weight or
//! protection.

use tracing::debug;

use crate::agent::AgentState;
use crate::config::MemoryConfig;
use crate::decay::half_life_factor;
use crate::memory::{MemoryRecord, MemoryTag};
use crate::types::GameTime;

/// What one maintenance pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Records culled for falling under the weight threshold.
    pub culled: usize,
    /// Records dropped by per-tag caps.
    pub tag_capped: usize,
    /// Records evicted by the hard cap.
    pub fifo_evicted: usize,
}

impl PruneReport {
    /// Total records removed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.culled + self.tag_capped + self.fifo_evicted
    }

    /// Fold another report into this one.
    pub fn absorb(&mut self, other: Self) {
        self.culled += other.culled;
        self.tag_capped += other.tag_capped;
        self.fifo_evicted += other.fifo_evicted;
    }
}

// ---------------------------------------------------------------------------
// Individual steps
// ---------------------------------------------------------------------------

/// Scale every decaying record by the half-life factor for `days`.
pub fn apply_half_life(memories: &mut [MemoryRecord], days: f64, half_life_days: f64) {
    let factor = half_life_factor(days, half_life_days);
    for record in memories.iter_mut().filter(|m| !m.never_forget) {
        record.weight *= factor;
    }
}

/// Remove decaying records with `|weight| < threshold`.
pub fn cull_below(memories: &mut Vec<MemoryRecord>, threshold: f32) -> usize {
    let before = memories.len();
    memories.retain(|m| m.never_forget || m.weight.abs() >= threshold);
    before - memories.len()
}

/// Drop the oldest live records carrying `tag` until at most `cap` remain.
///
/// Age is by timestamp; records created at the same time go in list order.
pub fn enforce_tag_cap(memories: &mut Vec<MemoryRecord>, tag: MemoryTag, cap: usize) -> usize {
    let mut tagged: Vec<usize> = memories
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_live() && m.has_tag(tag))
        .map(|(i, _)| i)
        .collect();

    if tagged.len() <= cap {
        return 0;
    }
    let excess = tagged.len() - cap;

    tagged.sort_by_key(|&i| (memories[i].timestamp, i));
    let mut doomed = vec![false; memories.len()];
    for &i in &tagged[..excess] {
        doomed[i] = true;
    }

    let mut index = 0;
    memories.retain(|_| {
        let keep = !doomed[index];
        index += 1;
        keep
    });
    excess
}

/// Evict the oldest records (by creation order) until at most `cap` remain.
pub fn enforce_hard_cap(memories: &mut Vec<MemoryRecord>, cap: usize) -> usize {
    if memories.len() <= cap {
        return 0;
    }
    let excess = memories.len() - cap;
    memories.drain(..excess);
    excess
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Run the maintenance pass on one agent.
///
/// Gated to once per simulated day via the agent's last-decay stamp;
/// returns `None` when it already ran today. The first pass treats one day
/// as elapsed.
pub fn run_maintenance(agent: &mut AgentState, now: GameTime, config: &MemoryConfig) -> Option<PruneReport> {
    let elapsed = match agent.last_decay() {
        Some(last) => {
            let days = now.days_since(last);
            if days < 1.0 {
                return None;
            }
            days
        }
        None => 1.0,
    };

    let actor = agent.actor();
    let memories = agent.memories_mut();
    let mut report = PruneReport::default();

    if let Some(half_life) = config.half_life_days {
        apply_half_life(memories, elapsed, half_life);
    }
    report.culled = cull_below(memories, config.cull_threshold);
    for cap in &config.tag_caps {
        report.tag_capped += enforce_tag_cap(memories, cap.tag, cap.cap);
    }
    report.fifo_evicted = enforce_hard_cap(memories, config.hard_cap);

    agent.mark_decayed(now);

    if report.total() > 0 {
        debug!(
            %actor,
            culled = report.culled,
            tag_capped = report.tag_capped,
            fifo_evicted = report.fifo_evicted,
            remaining = agent.len(),
            "Maintenance pass removed memories"
        );
    }
    Some(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
