pub mod domain;
pub mod ports;

pub use domain::{
    FileKind, FileMetadata, ProjectFiles, ProjectPatch, ProjectRecord, SearchField, StoreStats,
    TeamMember,
};
pub use ports::{MatchPolicy, NameAndPathPolicy, PortError, PortResult, ProjectStore};
