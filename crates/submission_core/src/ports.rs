//! crates/submission_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the portal's core logic.
//! Handlers only see these traits, so the JSON file store can later be swapped
//! for a transactional one without touching callers.

use async_trait::async_trait;
use crate::domain::{ProjectPatch, ProjectRecord, SearchField, StoreStats};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Appends a record and persists the collection.
    async fn create(&self, record: ProjectRecord) -> PortResult<ProjectRecord>;

    /// Applies `patch` to the record with `id`. Fails with `NotFound` if absent.
    async fn update(&self, id: &str, patch: ProjectPatch) -> PortResult<ProjectRecord>;

    async fn get_by_id(&self, id: &str) -> PortResult<ProjectRecord>;

    /// All records in insertion order.
    async fn get_all(&self) -> PortResult<Vec<ProjectRecord>>;

    /// Case-insensitive substring search, stable relative to storage order.
    async fn search(&self, query: &str, field: Option<SearchField>) -> PortResult<Vec<ProjectRecord>>;

    async fn stats(&self) -> PortResult<StoreStats>;

    /// Rewrites the backing storage.
    async fn compact(&self) -> PortResult<()>;
}

/// Decides whether a freshly completed submission is a repeat of a stored one.
pub trait MatchPolicy: Send + Sync {
    fn matches(&self, existing: &ProjectRecord, candidate: &ProjectRecord) -> bool;
}

/// Treats two submissions as the same project when both the project name and
/// the project path are equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameAndPathPolicy;

impl MatchPolicy for NameAndPathPolicy {
    fn matches(&self, existing: &ProjectRecord, candidate: &ProjectRecord) -> bool {
        existing.project_name == candidate.project_name
            && existing.project_path == candidate.project_path
    }
}
