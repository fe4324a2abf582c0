//! Handle stores: `(provider, person) → registry handle`.
//!
//! [`FileHandleStore`] persists a JSON document at
//! `<home>/.eppline/handles.json` using the atomic `.tmp` + rename pattern.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use eppline_core::{Fault, Handle, HandleStore, PersonId, ProviderId};

/// One persisted association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleRecord {
    pub provider_id: ProviderId,
    pub person_id: PersonId,
    pub registry_handle: Handle,
    pub created_at: DateTime<Utc>,
}

impl HandleRecord {
    pub fn new(provider_id: ProviderId, person_id: PersonId, registry_handle: Handle) -> Self {
        Self {
            provider_id,
            person_id,
            registry_handle,
            created_at: Utc::now(),
        }
    }
}

type Key = (ProviderId, PersonId);

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryHandleStore {
    records: RwLock<HashMap<Key, HandleRecord>>,
}

impl MemoryHandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<HandleRecord> {
        let mut out: Vec<_> = self.records.read().await.values().cloned().collect();
        out.sort_by(|a, b| {
            (&a.provider_id, a.person_id).cmp(&(&b.provider_id, b.person_id))
        });
        out
    }
}

#[async_trait]
impl HandleStore for MemoryHandleStore {
    async fn get(&self, provider: &ProviderId, person: PersonId) -> Result<Option<Handle>, Fault> {
        let records = self.records.read().await;
        Ok(records
            .get(&(provider.clone(), person))
            .map(|r| r.registry_handle.clone()))
    }

    async fn put(&self, provider: &ProviderId, person: PersonId, handle: Handle) -> Result<(), Fault> {
        let record = HandleRecord::new(provider.clone(), person, handle);
        self.records
            .write()
            .await
            .insert((provider.clone(), person), record);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// On disk
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
struct HandleFile {
    #[serde(default)]
    handles: Vec<HandleRecord>,
}

/// `<home>/.eppline/handles.json`: pure, no I/O.
pub fn store_path_at(home: &Path) -> PathBuf {
    home.join(".eppline").join("handles.json")
}

/// JSON-file handle store. Every write rewrites the file atomically; the
/// in-process lock serializes read-modify-write cycles.
#[derive(Debug)]
pub struct FileHandleStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileHandleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn at(home: &Path) -> Self {
        Self::new(store_path_at(home))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn records(&self) -> Result<Vec<HandleRecord>, Fault> {
        let _guard = self.lock.lock().await;
        Ok(self.load()?.handles)
    }

    fn load(&self) -> Result<HandleFile, Fault> {
        if !self.path.exists() {
            return Ok(HandleFile::default());
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|e| self.io_fault(e))?;
        serde_json::from_str(&contents).map_err(|e| {
            Fault::Persistence(format!("corrupt handle store {}: {e}", self.path.display()))
        })
    }

    fn save(&self, file: &HandleFile) -> Result<(), Fault> {
        let Some(dir) = self.path.parent() else {
            return Err(Fault::Persistence(format!(
                "invalid handle store path {}",
                self.path.display()
            )));
        };
        std::fs::create_dir_all(dir).map_err(|e| self.io_fault(e))?;

        let json = serde_json::to_string_pretty(file)
            .map_err(|e| Fault::Persistence(format!("serialize handle store: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_fault(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_fault(e))?;
        Ok(())
    }

    fn io_fault(&self, e: std::io::Error) -> Fault {
        Fault::Persistence(format!("{}: {e}", self.path.display()))
    }
}

#[async_trait]
impl HandleStore for FileHandleStore {
    async fn get(&self, provider: &ProviderId, person: PersonId) -> Result<Option<Handle>, Fault> {
        let _guard = self.lock.lock().await;
        Ok(self
            .load()?
            .handles
            .into_iter()
            .find(|r| &r.provider_id == provider && r.person_id == person)
            .map(|r| r.registry_handle))
    }

    async fn put(&self, provider: &ProviderId, person: PersonId, handle: Handle) -> Result<(), Fault> {
        let _guard = self.lock.lock().await;
        let mut file = self.load()?;
        file.handles
            .retain(|r| !(&r.provider_id == provider && r.person_id == person));
        file.handles
            .push(HandleRecord::new(provider.clone(), person, handle));
        self.save(&file)
    }
}
