//! Error types for the noble society core.
//!
//! Simulation operations (register, tick, gossip, ripple) never fail: missing
//! actors or empty social graphs make them no-ops. Only configuration loading
//! and persistence return errors.

use thiserror::Error;

/// Top-level error type for all fallible society operations.
#[derive(Error, Debug)]
pub enum SocietyError {
    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A memory snapshot's parallel lists disagree in length.
    #[error("Snapshot field `{field}` has {found} entries, expected {expected}")]
    SnapshotShape {
        /// Which parallel list is off.
        field: &'static str,
        /// Length of the `kinds` list.
        expected: usize,
        /// Length of the offending list.
        found: usize,
    },

    /// Stored checksum does not match the stored data.
    #[error("Checksum mismatch for actor {actor}")]
    ChecksumMismatch {
        /// The actor whose snapshot is corrupt.
        actor: crate::ActorId,
    },

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, SocietyError>;
