//! Configuration for the noble society simulation.
//!
//! Maps directly to `nobles.toml`. Every field has a serde default, so a
//! partial file (or an empty one) yields the reference tuning.

use serde::{Deserialize, Serialize};

use crate::memory::MemoryTag;

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocietyConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Per-actor memory decay and retention.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Gossip diffusion and anti-drift limits.
    #[serde(default)]
    pub gossip: GossipConfig,
    /// Relation ripple propagation.
    #[serde(default)]
    pub ripple: RippleConfig,
    /// Persistence / save settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl SocietyConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `SocietyError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::SocietyError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Whether the simulation is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Per-kind decay rates (weight lost per day at modifier 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayRates {
    /// Rate for ordinary memories.
    #[serde(default = "default_decay_rate")]
    pub default: f32,
    /// Rate for short-lived memories (minor favors, tournament losses).
    #[serde(default = "default_fast_decay")]
    pub fast: f32,
    /// Rate for slow-fading memories (trade deals, tournament wins).
    #[serde(default = "default_slow_decay")]
    pub slow: f32,
}

impl Default for DecayRates {
    fn default() -> Self {
        Self {
            default: 0.03,
            fast: 0.05,
            slow: 0.025,
        }
    }
}

/// A retention ceiling for records carrying one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCap {
    /// The tag being capped.
    pub tag: MemoryTag,
    /// Maximum live records carrying the tag.
    pub cap: usize,
}

/// Per-actor memory decay and retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Decay rates assigned at construction by kind.
    #[serde(default)]
    pub decay_rates: DecayRates,
    /// Hard cap on records per actor (oldest-first FIFO eviction).
    #[serde(default = "default_250")]
    pub hard_cap: usize,
    /// Per-tag soft caps, applied in order.
    #[serde(default = "default_tag_caps")]
    pub tag_caps: Vec<TagCap>,
    /// Half-life (days) of the maintenance pass's exponential decay.
    /// `None` disables the exponential step.
    #[serde(default = "default_half_life")]
    pub half_life_days: Option<f64>,
    /// Maintenance pass culls decaying records with `|weight|` below this.
    #[serde(default = "default_cull_threshold")]
    pub cull_threshold: f32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            decay_rates: DecayRates::default(),
            hard_cap: 250,
            tag_caps: default_tag_caps(),
            half_life_days: Some(27.0),
            cull_threshold: 0.20,
        }
    }
}

/// Gossip diffusion and relation anti-drift limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GossipConfig {
    /// How long gossip events stay in the observability log (days).
    #[serde(default = "default_20_f64")]
    pub log_lifespan_days: f64,
    /// Minimum days between two exchanges of the same pair (either direction).
    #[serde(default = "default_1_f64")]
    pub pair_cooldown_days: f64,
    /// Weight of a freshly heard rumour.
    #[serde(default = "default_0_1")]
    pub first_hearing_weight: f32,
    /// Weight added each time a rumour is heard again.
    #[serde(default = "default_0_05")]
    pub repeat_weight_bump: f32,
    /// Maximum repeat count recorded on a rumour.
    #[serde(default = "default_5")]
    pub max_repeat_count: u32,
    /// Max absolute relation change per listener→actor pair per 7 days.
    #[serde(default = "default_2")]
    pub weekly_pair_delta_cap: u32,
    /// Minimum days between applying the same reason to the same pair.
    #[serde(default = "default_5_f64")]
    pub same_reason_cooldown_days: f64,
    /// Only change relations when this hearing promoted a belief.
    #[serde(default)]
    pub require_belief_for_relation: bool,
    /// Fixed RNG seed for reproducible runs. `None` seeds from entropy.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            log_lifespan_days: 20.0,
            pair_cooldown_days: 1.0,
            first_hearing_weight: 0.1,
            repeat_weight_bump: 0.05,
            max_repeat_count: 5,
            weekly_pair_delta_cap: 2,
            same_reason_cooldown_days: 5.0,
            require_belief_for_relation: false,
            rng_seed: None,
        }
    }
}

/// Base weight of each observer ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingWeights {
    /// Spouse, parents, children, siblings.
    #[serde(default = "default_0_60")]
    pub family: f32,
    /// Lords of the same clan.
    #[serde(default = "default_0_35")]
    pub clan: f32,
    /// Actors with relation at or above the friend threshold.
    #[serde(default = "default_0_30")]
    pub friends: f32,
    /// Kingdom leader and every lord of the same kingdom.
    #[serde(default = "default_0_25")]
    pub hierarchy: f32,
}

impl Default for RingWeights {
    fn default() -> Self {
        Self {
            family: 0.60,
            clan: 0.35,
            friends: 0.30,
            hierarchy: 0.25,
        }
    }
}

/// Relation ripple propagation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RippleConfig {
    /// Ring base weights.
    #[serde(default)]
    pub rings: RingWeights,
    /// Max absolute ripple per observer.
    #[serde(default = "default_5_i32")]
    pub cap_per_observer: i32,
    /// Float magnitudes below this are discarded before rounding.
    #[serde(default = "default_0_5")]
    pub min_abs_threshold: f32,
    /// Max observers touched by one primary change.
    #[serde(default = "default_20_usize")]
    pub max_observers: usize,
    /// Relation at which another actor counts as a close friend.
    #[serde(default = "default_50")]
    pub friend_threshold: i32,
    /// Primary changes below this magnitude do not ripple.
    #[serde(default = "default_10")]
    pub materiality_threshold: i32,
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            rings: RingWeights::default(),
            cap_per_observer: 5,
            min_abs_threshold: 0.5,
            max_observers: 20,
            friend_threshold: 50,
            materiality_threshold: 10,
        }
    }
}

/// Persistence / save configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Use WAL mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Detect save corruption via checksums.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
    /// Rotating backups kept next to the save file (0 disables).
    #[serde(default = "default_3_u32")]
    pub backup_count: u32,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            wal_mode: true,
            checksum_enabled: true,
            backup_count: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_tag_caps() -> Vec<TagCap> {
    vec![
        TagCap { tag: MemoryTag::BattleVictory, cap: 180 },
        TagCap { tag: MemoryTag::BattleDefeat, cap: 180 },
        TagCap { tag: MemoryTag::Belief, cap: 120 },
        TagCap { tag: MemoryTag::Betrayal, cap: 120 },
        TagCap { tag: MemoryTag::TradeAgreement, cap: 80 },
        TagCap { tag: MemoryTag::Gossip, cap: 60 },
    ]
}

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
#[allow(clippy::unnecessary_wraps)]
fn default_half_life() -> Option<f64> { Some(27.0) }
fn default_decay_rate() -> f32 { 0.03 }
fn default_fast_decay() -> f32 { 0.05 }
fn default_slow_decay() -> f32 { 0.025 }
fn default_cull_threshold() -> f32 { 0.20 }
fn default_0_05() -> f32 { 0.05 }
fn default_0_1() -> f32 { 0.1 }
fn default_0_25() -> f32 { 0.25 }
fn default_0_30() -> f32 { 0.30 }
fn default_0_35() -> f32 { 0.35 }
fn default_0_5() -> f32 { 0.5 }
fn default_0_60() -> f32 { 0.60 }
fn default_1_f64() -> f64 { 1.0 }
fn default_5_f64() -> f64 { 5.0 }
fn default_20_f64() -> f64 { 20.0 }
fn default_2() -> u32 { 2 }
fn default_5() -> u32 { 5 }
fn default_3_u32() -> u32 { 3 }
fn default_5_i32() -> i32 { 5 }
fn default_10() -> i32 { 10 }
fn default_50() -> i32 { 50 }
fn default_20_usize() -> usize { 20 }
fn default_250() -> usize { 250 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_reference_tuning() {
        let config = SocietyConfig::from_toml("").expect("empty config parses");
        assert_eq!(config.memory.hard_cap, 250);
        assert_eq!(config.memory.tag_caps.len(), 6);
        assert_eq!(config.gossip.weekly_pair_delta_cap, 2);
        assert_eq!(config.ripple.max_observers, 20);
        assert!((config.memory.decay_rates.default - 0.03).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = SocietyConfig::from_toml(
            r#"
            [gossip]
            require_belief_for_relation = true
            rng_seed = 7

            [ripple]
            cap_per_observer = 3

            [[memory.tag_caps]]
            tag = "Gossip"
            cap = 10
            "#,
        )
        .expect("partial config parses");

        assert!(config.gossip.require_belief_for_relation);
        assert_eq!(config.gossip.rng_seed, Some(7));
        assert_eq!(config.gossip.pair_cooldown_days, 1.0);
        assert_eq!(config.ripple.cap_per_observer, 3);
        assert_eq!(config.ripple.friend_threshold, 50);
        assert_eq!(config.memory.tag_caps, vec![TagCap { tag: MemoryTag::Gossip, cap: 10 }]);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = SocietyConfig::from_toml("[memory\nhard_cap = ").unwrap_err();
        assert!(matches!(err, crate::SocietyError::Config(_)));
    }
}
