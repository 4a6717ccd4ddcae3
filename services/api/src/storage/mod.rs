//! services/api/src/storage/mod.rs
//!
//! Everything the portal does to project folders on disk.

pub mod archive;
pub mod completion;
pub mod migration;
pub mod naming;
pub mod staging;
pub mod structure;

pub use completion::{complete_project, CompletionError, CompletionRequest};
pub use migration::run_legacy_migration;
pub use staging::{ArtifactKind, StagedUpload, StagingError};
pub use structure::{create_project_structure, ensure_student_info, ProjectFolder};
