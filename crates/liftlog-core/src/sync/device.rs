//! Persistent device identity
//!
//! The backend correlates uploads by a device identifier generated once per
//! installation. The identifier and the last successful sync timestamp live
//! in a small JSON file beside the other local data.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DeviceRecord {
    device_id: String,
    last_sync: Option<DateTime<Utc>>,
}

/// Device identity and sync-watermark state, persisted to disk
#[derive(Debug)]
pub struct DeviceState {
    path: PathBuf,
    record: DeviceRecord,
}

impl DeviceState {
    /// Load the device state, generating a fresh identity on first use
    ///
    /// A corrupt state file is replaced with a new identity rather than
    /// failing.
    pub fn load_or_create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<DeviceRecord>(&contents) {
                Ok(record) => return Ok(Self { path, record }),
                Err(error) => {
                    warn!(%error, "Discarding corrupt device state, generating new identity");
                }
            }
        }

        let state = Self {
            path,
            record: DeviceRecord {
                device_id: Uuid::new_v4().to_string(),
                last_sync: None,
            },
        };
        state.save()?;
        Ok(state)
    }

    /// The stable device identifier
    pub fn device_id(&self) -> &str {
        &self.record.device_id
    }

    /// When the last successful sync happened, if ever
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.record.last_sync
    }

    /// Advance the sync watermark and persist it
    pub fn record_sync(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.record.last_sync = Some(at);
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.record)
            .map_err(|e| Error::Parse(format!("Failed to encode device state: {}", e)))?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}
