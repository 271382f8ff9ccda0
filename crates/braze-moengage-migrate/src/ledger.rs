//! Batch completion ledger.
//!
//! Persistent record of which batch signatures have already completed,
//! consulted before a run starts and written once when a batch first
//! completes. This is what gives idempotency across process restarts: a
//! reloaded caller re-submitting the same batch gets the stored result
//! instead of a second round of network calls.

use crate::error::{MigrateError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Completion record for one batch signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Whether the batch ran to completion.
    pub completed: bool,

    /// When the batch completed.
    pub completed_at: DateTime<Utc>,

    /// Campaigns that migrated successfully.
    pub success_count: usize,

    /// Campaigns that failed.
    pub failure_count: usize,

    /// The exact campaign-id set the signature covers, for verification.
    pub campaign_ids: Vec<String>,
}

/// Trait for completion ledger storage backends.
///
/// The orchestrator works with `Arc<dyn CompletionLedger>` without knowing
/// the concrete type, so tests and embedders can supply their own storage.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow sharing across async tasks.
#[async_trait]
pub trait CompletionLedger: Send + Sync {
    /// Look up the completion record for a batch signature.
    async fn get(&self, signature: &str) -> Result<Option<LedgerEntry>>;

    /// Store the completion record for a batch signature.
    async fn record(&self, signature: &str, entry: &LedgerEntry) -> Result<()>;

    /// Remove the record for a batch signature.
    ///
    /// The orchestrator never calls this; it exists for callers returning
    /// to campaign selection for a different batch.
    async fn clear(&self, signature: &str) -> Result<()>;

    /// Get the backend type name for logging/debugging.
    fn backend_type(&self) -> &'static str;
}

/// File-backed ledger: one JSON file holding a signature → entry map.
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    /// Create a ledger stored at `path`. The file is created on first write;
    /// a missing file reads as an empty ledger.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_map(&self) -> Result<HashMap<String, LedgerEntry>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&content)
            .map_err(|e| MigrateError::ledger(format!("ledger file is corrupt: {}", e)))
    }

    fn write_map(&self, map: &HashMap<String, LedgerEntry>) -> Result<()> {
        let content = serde_json::to_string_pretty(map)?;

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, &content)?;
        std::fs::rename(&temp_path, &self.path)?;

        Ok(())
    }
}

#[async_trait]
impl CompletionLedger for FileLedger {
    async fn get(&self, signature: &str) -> Result<Option<LedgerEntry>> {
        Ok(self.read_map()?.get(signature).cloned())
    }

    async fn record(&self, signature: &str, entry: &LedgerEntry) -> Result<()> {
        let mut map = self.read_map()?;
        map.insert(signature.to_string(), entry.clone());
        self.write_map(&map)
    }

    async fn clear(&self, signature: &str) -> Result<()> {
        let mut map = self.read_map()?;
        if map.remove(signature).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "file"
    }
}

/// In-memory ledger for tests and embedders that manage persistence
/// themselves.
#[derive(Default)]
pub struct MemoryLedger {
    entries: Mutex<HashMap<String, LedgerEntry>>,
}

impl MemoryLedger {
    /// Create an empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, LedgerEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CompletionLedger for MemoryLedger {
    async fn get(&self, signature: &str) -> Result<Option<LedgerEntry>> {
        Ok(self.lock().get(signature).cloned())
    }

    async fn record(&self, signature: &str, entry: &LedgerEntry) -> Result<()> {
        self.lock().insert(signature.to_string(), entry.clone());
        Ok(())
    }

    async fn clear(&self, signature: &str) -> Result<()> {
        self.lock().remove(signature);
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}
