//! Save/load of per-actor memory state.
//!
//! An agent is flattened to a [`MemorySnapshot`] (parallel lists of
//! primitive fields, no references) and stored as a JSON blob in SQLite:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS agent_snapshots (
//!     actor_id   TEXT PRIMARY KEY,
//!     data       BLOB NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT
//! );
//! ```
//!
//! WAL mode for reads during play, an optional CRC-32 per row, and backups
//! through SQLite's online-backup API.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::agent::{AgentRegistry, AgentState};
use crate::config::PersistenceConfig;
use crate::error::{Result, SocietyError};
use crate::memory::{MemoryKind, MemoryRecord, MemoryTag};
use crate::metrics::spans;
use crate::types::{ActorId, GameTime};

// ---------------------------------------------------------------------------
// MemorySnapshot
// ---------------------------------------------------------------------------

/// One agent's state as parallel lists of primitives.
///
/// `kinds`, `sources`, `targets`, `timestamps_days`, `weights`,
/// `decay_rates` and `never_forget` must all have the same length. The
/// remaining lists may be empty (older saves), in which case defaults are
/// used on restore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    /// Record kinds.
    pub kinds: Vec<MemoryKind>,
    /// Relayed kinds (`None` for first-hand records).
    #[serde(default)]
    pub original_kinds: Vec<Option<MemoryKind>>,
    /// Source actor ids.
    pub sources: Vec<ActorId>,
    /// Target actor ids.
    pub targets: Vec<ActorId>,
    /// Creation times in days.
    pub timestamps_days: Vec<f64>,
    /// Current weights.
    pub weights: Vec<f32>,
    /// Per-day decay rates.
    pub decay_rates: Vec<f32>,
    /// Never-forget flags.
    pub never_forget: Vec<bool>,
    /// Rumour repeat counts.
    #[serde(default)]
    pub repeat_counts: Vec<u32>,
    /// Tag sets.
    #[serde(default)]
    pub tags: Vec<Vec<MemoryTag>>,
    /// Notes.
    #[serde(default)]
    pub notes: Vec<String>,
    /// Last tick, in days.
    #[serde(default)]
    pub last_tick_day: Option<f64>,
    /// Last maintenance pass, in days.
    #[serde(default)]
    pub last_decay_day: Option<f64>,
}

impl MemorySnapshot {
    /// Flatten an agent.
    #[must_use]
    pub fn from_agent(agent: &AgentState) -> Self {
        let memories = agent.memories();
        Self {
            kinds: memories.iter().map(|m| m.kind).collect(),
            original_kinds: memories.iter().map(|m| m.original_kind).collect(),
            sources: memories.iter().map(|m| m.source).collect(),
            targets: memories.iter().map(|m| m.target).collect(),
            timestamps_days: memories.iter().map(|m| m.timestamp.days()).collect(),
            weights: memories.iter().map(|m| m.weight).collect(),
            decay_rates: memories.iter().map(|m| m.decay_rate).collect(),
            never_forget: memories.iter().map(|m| m.never_forget).collect(),
            repeat_counts: memories.iter().map(|m| m.repeat_count).collect(),
            tags: memories.iter().map(|m| m.tags.clone()).collect(),
            notes: memories.iter().map(|m| m.notes.clone()).collect(),
            last_tick_day: agent.last_tick().map(GameTime::days),
            last_decay_day: agent.last_decay().map(GameTime::days),
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Check that the parallel lists line up.
    ///
    /// # Errors
    /// Returns [`SocietyError::SnapshotShape`] naming the first list whose
    /// length disagrees with `kinds`.
    pub fn validate(&self) -> Result<()> {
        let expected = self.kinds.len();
        let required = [
            ("sources", self.sources.len()),
            ("targets", self.targets.len()),
            ("timestamps_days", self.timestamps_days.len()),
            ("weights", self.weights.len()),
            ("decay_rates", self.decay_rates.len()),
            ("never_forget", self.never_forget.len()),
        ];
        let optional = [
            ("original_kinds", self.original_kinds.len()),
            ("repeat_counts", self.repeat_counts.len()),
            ("tags", self.tags.len()),
            ("notes", self.notes.len()),
        ];

        for (field, found) in required {
            if found != expected {
                return Err(SocietyError::SnapshotShape { field, expected, found });
            }
        }
        for (field, found) in optional {
            if found != 0 && found != expected {
                return Err(SocietyError::SnapshotShape { field, expected, found });
            }
        }
        Ok(())
    }

    /// Rebuild the agent for `actor`.
    ///
    /// # Errors
    /// Returns [`SocietyError::SnapshotShape`] if the lists disagree.
    pub fn into_agent(self, actor: ActorId) -> Result<AgentState> {
        self.validate()?;

        let mut agent = AgentState::new(actor);
        for i in 0..self.len() {
            agent.push(MemoryRecord {
                kind: self.kinds[i],
                original_kind: self.original_kinds.get(i).copied().flatten(),
                source: self.sources[i],
                target: self.targets[i],
                timestamp: GameTime::from_days(self.timestamps_days[i]),
                weight: self.weights[i],
                decay_rate: self.decay_rates[i],
                never_forget: self.never_forget[i],
                repeat_count: self.repeat_counts.get(i).copied().unwrap_or(1),
                tags: self.tags.get(i).cloned().unwrap_or_default(),
                notes: self.notes.get(i).cloned().unwrap_or_default(),
            });
        }
        agent.set_bookkeeping(
            self.last_tick_day.map(GameTime::from_days),
            self.last_decay_day.map(GameTime::from_days),
        );
        Ok(agent)
    }
}

/// CRC-32 (ISO 3309) of `data` as lowercase hex.
fn crc32_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32fast::hash(data))
}

// ---------------------------------------------------------------------------
// PersistenceEngine
// ---------------------------------------------------------------------------

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS agent_snapshots (
    actor_id   TEXT PRIMARY KEY,
    data       BLOB NOT NULL,
    updated_at TEXT NOT NULL,
    checksum   TEXT
);";

/// Handle to an open SQLite save file.
///
/// ```no_run
/// # use noble_core::persistence::{MemorySnapshot, PersistenceEngine};
/// # use noble_core::config::PersistenceConfig;
/// # use noble_core::agent::AgentState;
/// # use noble_core::ActorId;
/// let engine = PersistenceEngine::open("campaign.db", &PersistenceConfig::default())?;
/// let actor = ActorId::new();
/// engine.save_snapshot(actor, &MemorySnapshot::from_agent(&AgentState::new(actor)))?;
/// let loaded = engine.load_snapshot(actor)?;
/// # Ok::<(), noble_core::SocietyError>(())
/// ```
pub struct PersistenceEngine {
    conn: Connection,
    config: PersistenceConfig,
    db_path: PathBuf,
}

impl std::fmt::Debug for PersistenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceEngine")
            .field("db_path", &self.db_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PersistenceEngine {
    /// Open (or create) a save file at `path`.
    ///
    /// # Errors
    /// Returns [`SocietyError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %db_path.display(), wal = config.wal_mode, "Society persistence opened");

        Ok(Self {
            conn,
            config: config.clone(),
            db_path,
        })
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns [`SocietyError::Database`] on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            config: config.clone(),
            db_path: PathBuf::from(":memory:"),
        })
    }

    // ------------------------------------------------------------------
    // Core CRUD
    // ------------------------------------------------------------------

    /// Save (upsert) one actor's snapshot.
    ///
    /// # Errors
    /// Returns [`SocietyError::Serialization`] if JSON encoding fails, or
    /// [`SocietyError::Database`] on SQLite failures.
    pub fn save_snapshot(&self, actor: ActorId, snapshot: &MemorySnapshot) -> Result<()> {
        let _span = info_span!(spans::PERSIST_SAVE, %actor).entered();
        let start = Instant::now();

        let json = serde_json::to_vec(snapshot).map_err(|e| SocietyError::Serialization(e.to_string()))?;
        let checksum = self.config.checksum_enabled.then(|| crc32_hex(&json));

        self.conn.execute(
            "INSERT INTO agent_snapshots (actor_id, data, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(actor_id) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![actor.0.to_string(), json, Utc::now().to_rfc3339(), checksum],
        )?;

        debug!(
            %actor,
            memories = snapshot.len(),
            bytes = json.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved agent snapshot"
        );
        Ok(())
    }

    /// Load one actor's snapshot, `None` if never saved.
    ///
    /// # Errors
    /// Returns [`SocietyError::ChecksumMismatch`] when checksums are enabled
    /// and the stored data does not match, [`SocietyError::Serialization`]
    /// if decoding fails, or [`SocietyError::Database`] on SQLite failures.
    pub fn load_snapshot(&self, actor: ActorId) -> Result<Option<MemorySnapshot>> {
        let _span = info_span!(spans::PERSIST_LOAD, %actor).entered();
        let start = Instant::now();

        let mut stmt = self
            .conn
            .prepare_cached("SELECT data, checksum FROM agent_snapshots WHERE actor_id = ?1")?;
        let row: Option<(Vec<u8>, Option<String>)> = stmt
            .query_row(params![actor.0.to_string()], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((data, stored_checksum)) = row else {
            return Ok(None);
        };

        if self.config.checksum_enabled {
            if let Some(expected) = stored_checksum {
                let actual = crc32_hex(&data);
                if expected != actual {
                    warn!(%actor, %expected, %actual, "Checksum mismatch, refusing corrupt snapshot");
                    return Err(SocietyError::ChecksumMismatch { actor });
                }
            }
        }

        let snapshot: MemorySnapshot =
            serde_json::from_slice(&data).map_err(|e| SocietyError::Serialization(e.to_string()))?;

        debug!(
            %actor,
            memories = snapshot.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Loaded agent snapshot"
        );
        Ok(Some(snapshot))
    }

    /// Save every agent in one transaction. Returns the number saved.
    ///
    /// # Errors
    /// Fails on the first agent that cannot be saved; nothing is committed.
    pub fn save_registry(&self, registry: &AgentRegistry) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut saved = 0;
        for agent in registry.iter() {
            self.save_snapshot(agent.actor(), &MemorySnapshot::from_agent(agent))?;
            saved += 1;
        }
        tx.commit()?;
        info!(agents = saved, "Saved society");
        Ok(saved)
    }

    /// Load every stored agent into a fresh registry.
    ///
    /// # Errors
    /// Fails on the first snapshot that cannot be loaded or restored.
    pub fn load_registry(&self) -> Result<AgentRegistry> {
        let mut registry = AgentRegistry::new();
        for actor in self.list_actors()? {
            if let Some(snapshot) = self.load_snapshot(actor)? {
                registry.insert(snapshot.into_agent(actor)?);
            }
        }
        info!(agents = registry.len(), "Loaded society");
        Ok(registry)
    }

    /// Delete one actor's snapshot. Returns whether a row was removed.
    ///
    /// # Errors
    /// Returns [`SocietyError::Database`] on SQLite failures.
    pub fn delete_snapshot(&self, actor: ActorId) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM agent_snapshots WHERE actor_id = ?1", params![actor.0.to_string()])?;
        Ok(deleted > 0)
    }

    /// Every actor with a stored snapshot.
    ///
    /// # Errors
    /// Returns [`SocietyError::Database`] on SQLite failures.
    pub fn list_actors(&self) -> Result<Vec<ActorId>> {
        let mut stmt = self.conn.prepare_cached("SELECT actor_id FROM agent_snapshots")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut actors = Vec::new();
        for row in rows {
            let id = row?;
            match uuid::Uuid::parse_str(&id) {
                Ok(uuid) => actors.push(ActorId(uuid)),
                Err(_) => warn!(%id, "Skipping row with invalid UUID"),
            }
        }
        Ok(actors)
    }

    /// Number of stored snapshots.
    ///
    /// # Errors
    /// Returns [`SocietyError::Database`] on SQLite failures.
    pub fn actor_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM agent_snapshots", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    // ------------------------------------------------------------------
    // Backup
    // ------------------------------------------------------------------

    /// Copy the database to `dest_path` with the online-backup API.
    ///
    /// # Errors
    /// Returns [`SocietyError::Database`] on SQLite failures.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> Result<()> {
        let start = Instant::now();
        let mut dest = Connection::open(dest_path.as_ref())?;
        let backup = rusqlite::backup::Backup::new(&self.conn, &mut dest)?;
        backup.run_to_completion(256, std::time::Duration::from_millis(50), None)?;

        info!(
            dest = %dest_path.as_ref().display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Database backup completed"
        );
        Ok(())
    }

    /// Write `<db>.bak.1`, shifting older backups up and keeping at most
    /// `backup_count`. A no-op for in-memory databases.
    ///
    /// # Errors
    /// Returns [`SocietyError::Database`] or [`SocietyError::Io`].
    pub fn create_rotating_backup(&self) -> Result<()> {
        let max = self.config.backup_count;
        if self.db_path.as_os_str() == ":memory:" || max == 0 {
            return Ok(());
        }

        for i in (1..max).rev() {
            let src = self.backup_path(i);
            if src.exists() {
                std::fs::rename(&src, self.backup_path(i + 1))?;
            }
        }
        let oldest = self.backup_path(max + 1);
        if oldest.exists() {
            std::fs::remove_file(&oldest)?;
        }

        self.backup(self.backup_path(1))
    }

    fn backup_path(&self, n: u32) -> PathBuf {
        let mut p = self.db_path.clone();
        let ext = format!(
            "{}.bak.{n}",
            p.extension().map_or(String::new(), |e| e.to_string_lossy().into_owned())
        );
        p.set_extension(ext);
        p
    }

    // ------------------------------------------------------------------
    // Utility
    // ------------------------------------------------------------------

    /// Path to the database file (`:memory:` for in-memory).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// `PRAGMA integrity_check`.
    ///
    /// # Errors
    /// Returns [`SocietyError::Database`] if the query itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self.conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
