//! services/api/src/storage/completion.rs
//!
//! Finalizes a submission: assembles the full record, upserts it into the
//! record store and mirrors it into the `project-info.json` sidecar.

use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use submission_core::domain::{FileMetadata, ProjectFiles, ProjectPatch, ProjectRecord, TeamMember};
use submission_core::ports::{MatchPolicy, PortError, ProjectStore};
use tracing::info;

use super::structure::{ensure_student_info, PROJECT_INFO_FILE};

/// Validated input of a completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub project_name: String,
    pub team_members: Vec<TeamMember>,
    pub project_path: PathBuf,
    pub folder_name: Option<String>,
    pub readme_file: Option<FileMetadata>,
    pub installation_file: Option<FileMetadata>,
    pub source_file: Option<FileMetadata>,
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("Project folder not found: {0}")]
    MissingFolder(String),
    #[error(transparent)]
    Port(#[from] PortError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to serialize project info: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Builds the record, inserts it or updates the stored match, and writes the sidecar.
pub async fn complete_project(
    store: &dyn ProjectStore,
    policy: &dyn MatchPolicy,
    request: CompletionRequest,
) -> Result<ProjectRecord, CompletionError> {
    if !tokio::fs::try_exists(&request.project_path).await? {
        return Err(CompletionError::MissingFolder(request.project_path.display().to_string()));
    }
    let folder = tokio::fs::canonicalize(&request.project_path).await?;
    let folder = folder.as_path();

    let student_info =
        ensure_student_info(folder, &request.project_name, &request.team_members).await?;

    let folder_name = request
        .folder_name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| folder.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default();

    let candidate = ProjectRecord {
        id: ProjectRecord::generate_id(),
        project_name: request.project_name,
        timestamp: Utc::now(),
        last_updated: None,
        team_members: request.team_members,
        folder_name,
        project_path: folder.to_string_lossy().into_owned(),
        files: ProjectFiles {
            readme: request.readme_file,
            installation: request.installation_file,
            source: request.source_file,
            student_info: Some(student_info),
        },
    };

    let existing = store
        .get_all()
        .await?
        .into_iter()
        .find(|r| policy.matches(r, &candidate));

    let record = match existing {
        Some(existing) => {
            info!("Updating existing project {} ({})", existing.id, existing.project_name);
            store.update(&existing.id, ProjectPatch::replace_with(candidate)).await?
        }
        None => {
            info!("Recording new project {} ({})", candidate.id, candidate.project_name);
            store.create(candidate).await?
        }
    };

    write_project_info(folder, &record).await?;
    Ok(record)
}

/// Writes the record as pretty-printed JSON into `<folder>/project-info.json`.
pub async fn write_project_info(folder: &Path, record: &ProjectRecord) -> Result<(), CompletionError> {
    let json = serde_json::to_string_pretty(record)?;
    tokio::fs::write(folder.join(PROJECT_INFO_FILE), json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::JsonFileStore;
    use crate::storage::structure::{create_project_structure, STUDENT_INFO_FILE};
    use submission_core::ports::NameAndPathPolicy;
    use tempfile::TempDir;

    fn request(path: &Path, readme_size: u64) -> CompletionRequest {
        CompletionRequest {
            project_name: "Test App".to_string(),
            team_members: vec![
                TeamMember { name: "Ann".to_string(), student_id: "1".to_string() },
                TeamMember { name: "Ben".to_string(), student_id: "2".to_string() },
            ],
            project_path: path.to_path_buf(),
            folder_name: None,
            readme_file: Some(FileMetadata {
                name: "ReadMe.txt".to_string(),
                path: path.join("2.README/ReadMe.txt").to_string_lossy().into_owned(),
                size: readme_size,
            }),
            installation_file: None,
            source_file: None,
        }
    }

    #[tokio::test]
    async fn test_repeat_completion_updates_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(temp_dir.path().join("db.json")).await.unwrap();
        let folder = create_project_structure(&temp_dir.path().join("root"), "Test App").await.unwrap();

        let first = complete_project(&store, &NameAndPathPolicy, request(&folder.path, 10)).await.unwrap();
        let second = complete_project(&store, &NameAndPathPolicy, request(&folder.path, 42)).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(second.id, first.id);
        assert_eq!(second.timestamp, first.timestamp);
        assert_eq!(all[0].files.readme.as_ref().map(|f| f.size), Some(42));
        assert_eq!(second.folder_name, folder.folder_name);
    }

    #[tokio::test]
    async fn test_sidecar_and_student_info_are_written() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(temp_dir.path().join("db.json")).await.unwrap();
        let folder = create_project_structure(temp_dir.path(), "Test App").await.unwrap();

        let record = complete_project(&store, &NameAndPathPolicy, request(&folder.path, 10)).await.unwrap();

        let info = folder.path.join(STUDENT_INFO_FILE);
        assert!(info.exists());
        let student_info = record.files.student_info.as_ref().unwrap();
        assert_eq!(student_info.size, std::fs::metadata(&info).unwrap().len());

        let sidecar = std::fs::read_to_string(folder.path.join(PROJECT_INFO_FILE)).unwrap();
        let parsed: ProjectRecord = serde_json::from_str(&sidecar).unwrap();
        assert_eq!(parsed, record);
    }

    #[tokio::test]
    async fn test_missing_folder_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(temp_dir.path().join("db.json")).await.unwrap();

        let result =
            complete_project(&store, &NameAndPathPolicy, request(&temp_dir.path().join("gone"), 1)).await;
        assert!(matches!(result, Err(CompletionError::MissingFolder(_))));
        assert!(store.get_all().await.unwrap().is_empty());
    }

    struct NeverMatch;
    impl MatchPolicy for NeverMatch {
        fn matches(&self, _: &ProjectRecord, _: &ProjectRecord) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_policy_is_injectable() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(temp_dir.path().join("db.json")).await.unwrap();
        let folder = create_project_structure(temp_dir.path(), "Test App").await.unwrap();

        complete_project(&store, &NeverMatch, request(&folder.path, 1)).await.unwrap();
        complete_project(&store, &NeverMatch, request(&folder.path, 2)).await.unwrap();

        assert_eq!(store.get_all().await.unwrap().len(), 2);
    }
}
