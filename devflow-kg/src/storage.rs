//! File-per-record persistence for entities and relationships
//!
//! Layout under the configured storage root:
//!
//! ```text
//! entities/<entityId>.json
//! relationships/<relationshipId>.json
//! ```
//!
//! Subdirectories are created lazily on first write. Records are written to
//! a temporary sibling and renamed into place so a crash never leaves a
//! half-written `.json` file behind.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, warn};

use crate::config::GraphConfig;
use crate::error::{KgError, Result};
use crate::schema::{Entity, Relationship};

/// Records read back from one storage directory
#[derive(Debug)]
pub struct Loaded<T> {
    /// Successfully parsed records
    pub records: Vec<T>,
    /// Files that could not be read or parsed
    pub skipped: usize,
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: 0,
        }
    }
}

/// On-disk store for graph records
#[derive(Debug, Clone)]
pub struct GraphStorage {
    entities_dir: PathBuf,
    relationships_dir: PathBuf,
}

impl GraphStorage {
    /// Create a storage handle rooted at `config.storage_dir`
    pub fn new(config: &GraphConfig) -> Self {
        Self {
            entities_dir: config.entities_dir(),
            relationships_dir: config.relationships_dir(),
        }
    }

    /// Path of the file holding entity `id`
    pub fn entity_path(&self, id: &str) -> PathBuf {
        self.entities_dir.join(format!("{}.json", id))
    }

    /// Path of the file holding relationship `id`
    pub fn relationship_path(&self, id: &str) -> PathBuf {
        self.relationships_dir.join(format!("{}.json", id))
    }

    /// Persist one entity
    pub async fn save_entity(&self, entity: &Entity) -> Result<PathBuf> {
        let path = self.entity_path(&entity.id);
        write_record(&self.entities_dir, &path, entity).await?;
        Ok(path)
    }

    /// Persist one relationship
    pub async fn save_relationship(&self, relationship: &Relationship) -> Result<PathBuf> {
        let path = self.relationship_path(&relationship.id);
        write_record(&self.relationships_dir, &path, relationship).await?;
        Ok(path)
    }

    /// Read every persisted entity
    pub async fn load_entities(&self) -> Loaded<Entity> {
        load_dir(&self.entities_dir).await
    }

    /// Read every persisted relationship
    pub async fn load_relationships(&self) -> Loaded<Relationship> {
        load_dir(&self.relationships_dir).await
    }
}

async fn write_record<T: Serialize>(dir: &Path, path: &Path, record: &T) -> Result<()> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| KgError::io(dir, e))?;

    let json = serde_json::to_vec_pretty(record)?;
    let tmp = path.with_extension("json.tmp");

    fs::write(&tmp, json).await.map_err(|e| KgError::io(&tmp, e))?;
    fs::rename(&tmp, path).await.map_err(|e| KgError::io(path, e))?;

    debug!("Persisted record {:?}", path);
    Ok(())
}

async fn load_dir<T: DeserializeOwned>(dir: &Path) -> Loaded<T> {
    let mut loaded = Loaded::default();

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Storage directory {:?} does not exist yet", dir);
            return loaded;
        }
        Err(e) => {
            warn!("Failed to list {:?}: {}", dir, e);
            return loaded;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read entry in {:?}: {}", dir, e);
                break;
            }
        };

        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }

        match read_record(&path).await {
            Ok(record) => loaded.records.push(record),
            Err(e) => {
                warn!("Skipping unreadable record: {}", e);
                loaded.skipped += 1;
            }
        }
    }

    loaded
}

async fn read_record<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).await.map_err(|e| KgError::io(path, e))?;
    Ok(serde_json::from_slice(&bytes)?)
}
