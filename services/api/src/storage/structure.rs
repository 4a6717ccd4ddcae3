//! services/api/src/storage/structure.rs
//!
//! Creates the on-disk layout of a project folder and writes the
//! `student-info.txt` summary at its root.

use chrono::Local;
use std::io;
use std::path::{Path, PathBuf};
use submission_core::domain::{FileMetadata, TeamMember};
use tracing::info;

use super::naming::folder_name_for;

pub const INSTALLATION_DIR: &str = "1.INSTALLATION";
pub const README_DIR: &str = "2.README";
pub const SOURCE_DIR: &str = "3.SOURCE";
pub const STUDENT_INFO_FILE: &str = "student-info.txt";
pub const PROJECT_INFO_FILE: &str = "project-info.json";

/// A freshly created (or reused) project folder.
#[derive(Debug, Clone)]
pub struct ProjectFolder {
    pub path: PathBuf,
    pub folder_name: String,
}

/// Creates `<base>/<folderName>/{1.INSTALLATION,2.README,3.SOURCE}`.
///
/// `base` is created if needed and resolved to an absolute path first.
/// Directories that already exist are left as they are, including any files in them.
pub async fn create_project_structure(base: &Path, project_name: &str) -> io::Result<ProjectFolder> {
    tokio::fs::create_dir_all(base).await?;
    let base = tokio::fs::canonicalize(base).await?;
    let folder_name = folder_name_for(project_name);
    let path = base.join(&folder_name);

    for sub in [INSTALLATION_DIR, README_DIR, SOURCE_DIR] {
        tokio::fs::create_dir_all(path.join(sub)).await?;
    }

    info!("Project structure ready at {}", path.display());
    Ok(ProjectFolder { path, folder_name })
}

/// Renders the plain-text team summary.
pub fn render_student_info(project_name: &str, members: &[TeamMember]) -> String {
    let mut out = format!(
        "Project: {}\nGenerated: {}\n\nTeam Members:\n",
        project_name,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    for (i, member) in members.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} (Student ID: {})\n",
            i + 1,
            member.name,
            member.student_id
        ));
    }
    out
}

/// Writes `student-info.txt` into `folder` unless it is already there, and
/// returns its metadata either way.
pub async fn ensure_student_info(
    folder: &Path,
    project_name: &str,
    members: &[TeamMember],
) -> io::Result<FileMetadata> {
    let path = folder.join(STUDENT_INFO_FILE);
    if !tokio::fs::try_exists(&path).await? {
        tokio::fs::write(&path, render_student_info(project_name, members)).await?;
    }
    file_metadata(&path).await
}

/// Reads size and name of an existing file.
pub async fn file_metadata(path: &Path) -> io::Result<FileMetadata> {
    let meta = tokio::fs::metadata(path).await?;
    Ok(FileMetadata {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_string_lossy().into_owned(),
        size: meta.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn members() -> Vec<TeamMember> {
        vec![
            TeamMember { name: "Ann Lee".to_string(), student_id: "S-1".to_string() },
            TeamMember { name: "Ben Ode".to_string(), student_id: "S-2".to_string() },
        ]
    }

    #[tokio::test]
    async fn test_structure_is_created() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("not-yet-there");

        let folder = create_project_structure(&base, "Test App").await.unwrap();

        assert!(folder.folder_name.starts_with("Test_App_"));
        assert_eq!(folder.path, base.canonicalize().unwrap().join(&folder.folder_name));
        for sub in [INSTALLATION_DIR, README_DIR, SOURCE_DIR] {
            assert!(folder.path.join(sub).is_dir());
        }
    }

    #[tokio::test]
    async fn test_existing_folder_is_reused_without_losing_files() {
        let temp_dir = TempDir::new().unwrap();
        let first = create_project_structure(temp_dir.path(), "Test App").await.unwrap();
        let artifact = first.path.join(README_DIR).join("ReadMe.txt");
        std::fs::write(&artifact, "keep me").unwrap();

        let second = create_project_structure(temp_dir.path(), "Test App").await.unwrap();
        let again = create_project_structure(temp_dir.path(), "Test App").await;
        assert!(again.is_ok());

        assert!(second.path.join(SOURCE_DIR).is_dir());
        assert_eq!(std::fs::read_to_string(&artifact).unwrap(), "keep me");
    }

    #[tokio::test]
    async fn test_relative_base_yields_absolute_paths() {
        let scratch = TempDir::new_in(".").unwrap();
        let relative = Path::new(".").join(scratch.path().file_name().unwrap()).join("saves");
        assert!(relative.is_relative());

        let folder = create_project_structure(&relative, "Test App").await.unwrap();

        assert!(folder.path.is_absolute());
        assert!(folder.path.join(README_DIR).is_dir());
        let meta = ensure_student_info(&folder.path, "Test App", &members()).await.unwrap();
        assert!(Path::new(&meta.path).is_absolute());
    }

    #[tokio::test]
    async fn test_unwritable_base_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        assert!(create_project_structure(&blocker, "Test App").await.is_err());
    }

    #[tokio::test]
    async fn test_student_info_is_written_once() {
        let temp_dir = TempDir::new().unwrap();

        let meta = ensure_student_info(temp_dir.path(), "Test App", &members()).await.unwrap();
        let text = std::fs::read_to_string(&meta.path).unwrap();
        assert!(text.starts_with("Project: Test App\n"));
        assert!(text.contains("1. Ann Lee (Student ID: S-1)"));
        assert!(text.contains("2. Ben Ode (Student ID: S-2)"));
        assert_eq!(meta.size, text.len() as u64);
        assert_eq!(meta.name, STUDENT_INFO_FILE);

        let again = ensure_student_info(temp_dir.path(), "Renamed", &[]).await.unwrap();
        assert_eq!(std::fs::read_to_string(&again.path).unwrap(), text);
    }
}
