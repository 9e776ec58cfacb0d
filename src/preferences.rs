//! Persisted user preferences
//!
//! A flat string map stored as pretty JSON. Writes replace the whole file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::TransactionReceipt;
use crate::flows::PostSuccessAction;
use crate::infra::{PreferenceStore, Result, StorageError};

/// Key holding the tab the bounty view opens on
pub const ACTIVE_TAB_KEY: &str = "bounty-active-tab";

/// Tab shown after a proof lands on-chain
pub const DETAILS_TAB: &str = "details";

/// Preference store backed by a JSON file
pub struct FilePreferenceStore {
    path: PathBuf,
    // Serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes).map_err(StorageError::from)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StorageError::from(e).into()),
        }
    }
}

#[async_trait]
impl PreferenceStore for FilePreferenceStore {
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _held = self.lock.lock().await;

        let mut prefs = self.load().await?;
        prefs.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(StorageError::from)?;
            }
        }
        let bytes = serde_json::to_vec_pretty(&prefs).map_err(StorageError::from)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(StorageError::from)?;

        debug!(key, value, path = %self.path.display(), "Preference saved");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _held = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }
}

/// Post-success action that opens the bounty on its details tab next time
pub struct PersistTabPreference {
    store: Arc<dyn PreferenceStore>,
}

impl PersistTabPreference {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PostSuccessAction for PersistTabPreference {
    async fn on_success(&self, receipt: &TransactionReceipt) -> Result<()> {
        self.store.set(ACTIVE_TAB_KEY, DETAILS_TAB).await?;
        info!(tx_hash = %receipt.tx_hash, "Active tab set to {}", DETAILS_TAB);
        Ok(())
    }
}
