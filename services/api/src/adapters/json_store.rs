//! services/api/src/adapters/json_store.rs
//!
//! The JSON file adapter, the concrete implementation of the `ProjectStore`
//! port from the `core` crate. The whole collection is held in memory and the
//! backing file is rewritten in full after every mutating call.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use submission_core::domain::{ProjectPatch, ProjectRecord, SearchField, StoreStats};
use submission_core::ports::{PortError, PortResult, ProjectStore};
use tokio::sync::Mutex;
use tracing::{debug, info};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A record store that implements the `ProjectStore` port on top of one JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    projects: Mutex<Vec<ProjectRecord>>,
}

impl JsonFileStore {
    /// Loads the store from `path`, creating an empty document if the file does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> PortResult<Self> {
        let path = path.into();

        let projects = match tokio::fs::read(&path).await {
            Ok(bytes) => StoreDocument::parse(&bytes)
                .map_err(|e| PortError::Unexpected(format!("Corrupt store file {}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No store file at {}, starting empty", path.display());
                let empty = Vec::new();
                write_document(&path, &empty).await?;
                empty
            }
            Err(e) => return Err(io_error(&path, e)),
        };

        info!("Loaded {} project records from {}", projects.len(), path.display());
        Ok(Self {
            path,
            projects: Mutex::new(projects),
        })
    }
}

//=========================================================================================
// On-disk Document
//=========================================================================================

/// The shape written to disk. Older files held a bare array; both are accepted on load.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoreDocument {
    Wrapped { projects: Vec<ProjectRecord> },
    Bare(Vec<ProjectRecord>),
}

impl StoreDocument {
    fn parse(bytes: &[u8]) -> Result<Vec<ProjectRecord>, serde_json::Error> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(match serde_json::from_slice(bytes)? {
            StoreDocument::Wrapped { projects } => projects,
            StoreDocument::Bare(projects) => projects,
        })
    }
}

#[derive(Serialize)]
struct StoreDocumentRef<'a> {
    projects: &'a [ProjectRecord],
}

async fn write_document(path: &Path, projects: &[ProjectRecord]) -> PortResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(parent, e))?;
    }
    let json = serde_json::to_vec_pretty(&StoreDocumentRef { projects })
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
    tokio::fs::write(path, json).await.map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, e: std::io::Error) -> PortError {
    PortError::Unexpected(format!("{}: {}", path.display(), e))
}

//=========================================================================================
// `ProjectStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProjectStore for JsonFileStore {
    async fn create(&self, record: ProjectRecord) -> PortResult<ProjectRecord> {
        let mut projects = self.projects.lock().await;
        let mut next = projects.clone();
        next.push(record.clone());
        write_document(&self.path, &next).await?;
        *projects = next;
        debug!("Created project record {}", record.id);
        Ok(record)
    }

    async fn update(&self, id: &str, patch: ProjectPatch) -> PortResult<ProjectRecord> {
        let mut projects = self.projects.lock().await;
        let mut next = projects.clone();
        let record = next
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Project {} not found", id)))?;
        patch.apply_to(record, Utc::now());
        let updated = record.clone();
        write_document(&self.path, &next).await?;
        *projects = next;
        debug!("Updated project record {}", id);
        Ok(updated)
    }

    async fn get_by_id(&self, id: &str) -> PortResult<ProjectRecord> {
        self.projects
            .lock()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Project {} not found", id)))
    }

    async fn get_all(&self) -> PortResult<Vec<ProjectRecord>> {
        Ok(self.projects.lock().await.clone())
    }

    async fn search(&self, query: &str, field: Option<SearchField>) -> PortResult<Vec<ProjectRecord>> {
        let needle = query.trim().to_lowercase();
        let projects = self.projects.lock().await;
        if needle.is_empty() {
            return Ok(projects.clone());
        }
        Ok(projects
            .iter()
            .filter(|r| r.matches_query(&needle, field))
            .cloned()
            .collect())
    }

    async fn stats(&self) -> PortResult<StoreStats> {
        Ok(StoreStats::from_records(&self.projects.lock().await))
    }

    async fn compact(&self) -> PortResult<()> {
        let mut projects = self.projects.lock().await;
        let before = projects.len();

        // Later occurrences of an id win, the first position is kept.
        let mut position: HashMap<String, usize> = HashMap::new();
        let mut compacted: Vec<ProjectRecord> = Vec::with_capacity(before);
        for record in projects.iter().cloned() {
            match position.get(&record.id) {
                Some(&idx) => compacted[idx] = record,
                None => {
                    position.insert(record.id.clone(), compacted.len());
                    compacted.push(record);
                }
            }
        }
        write_document(&self.path, &compacted).await?;
        *projects = compacted;
        info!("Compacted store: {} -> {} records", before, projects.len());
        Ok(())
    }
}
