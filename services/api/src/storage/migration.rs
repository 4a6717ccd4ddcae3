//! services/api/src/storage/migration.rs
//!
//! One-shot upgrade of project folders created under the old layout:
//! unnumbered subfolders, `team-members.txt` and the numbered student-info file.
//! Each project is handled on its own; a failing project is logged and skipped.

use std::io;
use std::path::{Path, PathBuf};
use submission_core::domain::{FileMetadata, ProjectFiles, ProjectPatch, ProjectRecord};
use submission_core::ports::{PortError, PortResult, ProjectStore};
use tracing::{info, warn};

use super::completion::{write_project_info, CompletionError};
use super::structure::{
    render_student_info, INSTALLATION_DIR, PROJECT_INFO_FILE, README_DIR, SOURCE_DIR,
    STUDENT_INFO_FILE,
};

/// Old subfolder names and the numbered folder each one becomes.
const LEGACY_DIRS: [(&[&str], &str); 3] = [
    (&["INSTALLATION", "installation"], INSTALLATION_DIR),
    (&["README", "readme"], README_DIR),
    (&["SOURCE", "source"], SOURCE_DIR),
];

const DEPRECATED_FILES: [&str; 2] = ["team-members.txt", "0.student-info.txt"];

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Project folder not found: {0}")]
    MissingFolder(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Port(#[from] PortError),
    #[error(transparent)]
    Sidecar(#[from] CompletionError),
}

/// What was done to one folder on disk.
#[derive(Debug, Default)]
pub struct FolderChanges {
    pub renamed: Vec<(PathBuf, PathBuf)>,
    pub removed: Vec<PathBuf>,
    pub student_info: Option<FileMetadata>,
    pub wrote_student_info: bool,
}

impl FolderChanges {
    fn touched_disk(&self) -> bool {
        !self.renamed.is_empty() || !self.removed.is_empty() || self.wrote_student_info
    }
}

/// Upgrades every stored project and returns how many of them changed.
pub async fn run_legacy_migration(store: &dyn ProjectStore) -> PortResult<usize> {
    let records = store.get_all().await?;
    let total = records.len();
    let mut updated = 0;

    for record in records {
        let id = record.id.clone();
        match migrate_project(store, record).await {
            Ok(true) => updated += 1,
            Ok(false) => {}
            Err(e) => warn!("Skipping project {} during folder migration: {}", id, e),
        }
    }

    info!("Folder migration finished: {} of {} projects updated", updated, total);
    Ok(updated)
}

async fn migrate_project(store: &dyn ProjectStore, record: ProjectRecord) -> Result<bool, MigrationError> {
    let folder = PathBuf::from(&record.project_path);
    let blocking_record = record.clone();
    let changes = tokio::task::spawn_blocking(move || migrate_folder(&folder, &blocking_record))
        .await
        .map_err(io::Error::other)??;

    let mut files = rewrite_paths(&record.files, &changes.renamed);
    if changes.student_info.is_some() {
        files.student_info = changes.student_info.clone();
    }

    if !changes.touched_disk() && files == record.files {
        return Ok(false);
    }

    let current = if files != record.files {
        let patch = ProjectPatch { files: Some(files), ..Default::default() };
        store.update(&record.id, patch).await?
    } else {
        record
    };

    let folder = Path::new(&current.project_path);
    if folder.join(PROJECT_INFO_FILE).exists() {
        write_project_info(folder, &current).await?;
    }

    info!("Migrated project folder {}", current.project_path);
    Ok(true)
}

/// Applies the layout upgrade to one folder. Blocking.
pub fn migrate_folder(folder: &Path, record: &ProjectRecord) -> Result<FolderChanges, MigrationError> {
    if !folder.is_dir() {
        return Err(MigrationError::MissingFolder(folder.display().to_string()));
    }
    let mut changes = FolderChanges::default();

    for (legacy_names, numbered) in LEGACY_DIRS {
        let target = folder.join(numbered);
        if target.exists() {
            continue;
        }
        if let Some(old) = legacy_names.iter().map(|n| folder.join(n)).find(|p| p.is_dir()) {
            std::fs::rename(&old, &target)?;
            changes.renamed.push((old, target));
        } else {
            std::fs::create_dir_all(&target)?;
        }
    }

    let student_info = folder.join(STUDENT_INFO_FILE);
    if !student_info.exists() {
        std::fs::write(
            &student_info,
            render_student_info(&record.project_name, &record.team_members),
        )?;
        changes.wrote_student_info = true;
    }
    let size = std::fs::metadata(&student_info)?.len();
    changes.student_info = Some(FileMetadata {
        name: STUDENT_INFO_FILE.to_string(),
        path: student_info.to_string_lossy().into_owned(),
        size,
    });

    for name in DEPRECATED_FILES {
        let path = folder.join(name);
        if path.is_file() {
            std::fs::remove_file(&path)?;
            changes.removed.push(path);
        }
    }

    Ok(changes)
}

/// Points file entries that lived in a renamed folder at their new location.
fn rewrite_paths(files: &ProjectFiles, renamed: &[(PathBuf, PathBuf)]) -> ProjectFiles {
    let mut out = files.clone();
    for (kind, meta) in files.iter() {
        let path = Path::new(&meta.path);
        let moved = renamed.iter().find_map(|(old, new)| {
            path.strip_prefix(old).ok().map(|rest| new.join(rest))
        });
        if let Some(new_path) = moved {
            out.set(
                kind,
                Some(FileMetadata {
                    path: new_path.to_string_lossy().into_owned(),
                    ..meta.clone()
                }),
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::JsonFileStore;
    use chrono::Utc;
    use submission_core::domain::TeamMember;
    use tempfile::TempDir;

    fn legacy_record(folder: &Path) -> ProjectRecord {
        let readme = folder.join("README").join("ReadMe.md");
        ProjectRecord {
            id: ProjectRecord::generate_id(),
            project_name: "Old App".to_string(),
            timestamp: Utc::now(),
            last_updated: None,
            team_members: vec![TeamMember { name: "Ann".to_string(), student_id: "7".to_string() }],
            folder_name: folder.file_name().unwrap().to_string_lossy().into_owned(),
            project_path: folder.to_string_lossy().into_owned(),
            files: ProjectFiles {
                readme: Some(FileMetadata {
                    name: "ReadMe.md".to_string(),
                    path: readme.to_string_lossy().into_owned(),
                    size: 4,
                }),
                ..Default::default()
            },
        }
    }

    fn legacy_folder(root: &Path) -> PathBuf {
        let folder = root.join("Old_App_2023-01-01_00-00-00");
        std::fs::create_dir_all(folder.join("README")).unwrap();
        std::fs::create_dir_all(folder.join("installation")).unwrap();
        std::fs::write(folder.join("README").join("ReadMe.md"), b"# hi").unwrap();
        std::fs::write(folder.join("team-members.txt"), b"Ann").unwrap();
        std::fs::write(folder.join("0.student-info.txt"), b"Ann 7").unwrap();
        folder
    }

    #[test]
    fn test_folder_is_upgraded() {
        let temp_dir = TempDir::new().unwrap();
        let folder = legacy_folder(temp_dir.path());
        let record = legacy_record(&folder);

        let changes = migrate_folder(&folder, &record).unwrap();

        assert_eq!(changes.renamed.len(), 2);
        assert!(folder.join(README_DIR).join("ReadMe.md").exists());
        assert!(folder.join(INSTALLATION_DIR).is_dir());
        assert!(folder.join(SOURCE_DIR).is_dir());
        assert!(!folder.join("README").exists());
        assert!(!folder.join("team-members.txt").exists());
        assert!(!folder.join("0.student-info.txt").exists());
        let info = std::fs::read_to_string(folder.join(STUDENT_INFO_FILE)).unwrap();
        assert!(info.contains("1. Ann (Student ID: 7)"));
    }

    #[tokio::test]
    async fn test_migration_counts_and_skips_broken_projects() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(temp_dir.path().join("db.json")).await.unwrap();
        let folder = legacy_folder(temp_dir.path());
        let good = store.create(legacy_record(&folder)).await.unwrap();
        write_project_info(&folder, &good).await.unwrap();
        store.create(legacy_record(&temp_dir.path().join("vanished"))).await.unwrap();

        let updated = run_legacy_migration(&store).await.unwrap();
        assert_eq!(updated, 1);

        let stored = store.get_by_id(&good.id).await.unwrap();
        let readme = stored.files.readme.clone().unwrap();
        assert_eq!(
            PathBuf::from(readme.path),
            folder.join(README_DIR).join("ReadMe.md")
        );
        assert!(stored.files.student_info.is_some());

        let sidecar = std::fs::read_to_string(folder.join(PROJECT_INFO_FILE)).unwrap();
        let sidecar: ProjectRecord = serde_json::from_str(&sidecar).unwrap();
        assert_eq!(sidecar, stored);

        // A second run finds nothing left to do.
        assert_eq!(run_legacy_migration(&store).await.unwrap(), 0);
    }
}
