//! Persisted instance state
//!
//! The store maps each instance address to the document of its last
//! *completed* operation. An address has a document if and only if a
//! create (or read, for data) succeeded and no delete has succeeded
//! since. Every mutation is flushed to disk before it returns, via a
//! temp-file rename, so a crash after `upsert` never loses the record
//! and a reader never observes a half-written file.
//!
//! Known limitation of the lifecycle model: there is no durable
//! intermediate state, so a crash between a plugin mutating the real
//! world and the matching store write leaves the two diverged with no
//! automatic detection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::instance::Document;

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    /// Last time any document was written or removed
    last_updated: DateTime<Utc>,
    #[serde(default)]
    instances: BTreeMap<String, Document>,
}

/// Durable map of instance address to last-known state document
///
/// Mutators take `&mut self`, which is the per-address serialization the
/// engine needs: two writers can never interleave on the same address.
#[derive(Debug)]
pub struct InstanceStore {
    path: PathBuf,
    instances: BTreeMap<String, Document>,
    last_updated: DateTime<Utc>,
}

impl InstanceStore {
    /// Open the store backed by `path`, loading any existing state file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            log::debug!("state file {} does not exist, starting empty", path.display());
            return Ok(Self {
                path,
                instances: BTreeMap::new(),
                last_updated: Utc::now(),
            });
        }

        let content = fs::read_to_string(&path)?;
        let file: StoreFile = serde_json::from_str(&content)?;
        log::debug!(
            "loaded {} instance(s) from {}",
            file.instances.len(),
            path.display()
        );

        Ok(Self {
            path,
            instances: file.instances,
            last_updated: file.last_updated,
        })
    }

    pub fn exists(&self, address: &str) -> bool {
        self.instances.contains_key(address)
    }

    /// Look up the document for `address`.
    pub fn find(&self, address: &str) -> Result<&Document> {
        self.instances
            .get(address)
            .ok_or_else(|| Error::NotFound(address.to_string()))
    }

    /// Insert or overwrite the document for `address` and flush to disk.
    pub fn upsert(&mut self, address: &str, document: Document) -> Result<()> {
        self.instances.insert(address.to_string(), document);
        self.persist()
    }

    /// Remove the document for `address` (no-op if absent) and flush.
    pub fn delete(&mut self, address: &str) -> Result<()> {
        self.instances.remove(address);
        self.persist()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Document)> {
        self.instances
            .iter()
            .map(|(address, document)| (address.as_str(), document))
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    fn persist(&mut self) -> Result<()> {
        self.last_updated = Utc::now();

        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let file = StoreFile {
            last_updated: self.last_updated,
            instances: self.instances.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &content)?;
        fs::rename(&tmp, &self.path)?;

        log::debug!("saved state to {}", self.path.display());
        Ok(())
    }
}
