//! services/api/src/storage/staging.rs
//!
//! Upload staging: an incoming file is streamed into a temporary file in the
//! staging area and then moved into its project subfolder under a fixed name.
//! The temporary file is removed on every path that does not end in a move.

use std::io;
use std::path::Path;
use submission_core::domain::{FileKind, FileMetadata};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::structure::{file_metadata, INSTALLATION_DIR, README_DIR, SOURCE_DIR};

/// The three uploadable artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Installation,
    Readme,
    Source,
}

impl ArtifactKind {
    /// The multipart field carrying the file.
    pub fn field_name(&self) -> &'static str {
        match self {
            ArtifactKind::Installation => "installation",
            ArtifactKind::Readme => "readme",
            ArtifactKind::Source => "source",
        }
    }

    pub fn subfolder(&self) -> &'static str {
        match self {
            ArtifactKind::Installation => INSTALLATION_DIR,
            ArtifactKind::Readme => README_DIR,
            ArtifactKind::Source => SOURCE_DIR,
        }
    }

    pub fn file_kind(&self) -> FileKind {
        match self {
            ArtifactKind::Installation => FileKind::Installation,
            ArtifactKind::Readme => FileKind::Readme,
            ArtifactKind::Source => FileKind::Source,
        }
    }

    /// The normalized name the artifact is stored under.
    pub fn target_file_name(&self, original_name: &str) -> String {
        let ext = Path::new(original_name)
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .filter(|e| !e.is_empty());

        match (self, ext) {
            (ArtifactKind::Installation, Some(ext)) => format!("installation.{}", ext),
            (ArtifactKind::Installation, None) => "installation".to_string(),
            (ArtifactKind::Readme, Some(ext)) => format!("ReadMe.{}", ext),
            (ArtifactKind::Readme, None) => "ReadMe.txt".to_string(),
            (ArtifactKind::Source, _) => "project.zip".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("File exceeds the upload limit of {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("IO error while staging upload: {0}")]
    Io(#[from] io::Error),
}

/// An upload in progress. Dropping it deletes the staged bytes.
pub struct StagedUpload {
    temp: NamedTempFile,
    writer: tokio::fs::File,
    original_name: String,
    size: u64,
    limit: u64,
}

impl StagedUpload {
    /// Opens a new, uniquely named temporary file inside `staging_dir`.
    pub fn create(staging_dir: &Path, original_name: &str, limit: u64) -> Result<Self, StagingError> {
        std::fs::create_dir_all(staging_dir)?;
        let temp = tempfile::Builder::new()
            .prefix("upload-")
            .tempfile_in(staging_dir)?;
        let writer = tokio::fs::File::from_std(temp.reopen()?);
        debug!("Staging '{}' at {}", original_name, temp.path().display());

        Ok(Self {
            temp,
            writer,
            original_name: original_name.to_string(),
            size: 0,
            limit,
        })
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StagingError> {
        let next = self.size + chunk.len() as u64;
        if next > self.limit {
            return Err(StagingError::TooLarge { limit: self.limit });
        }
        self.writer.write_all(chunk).await?;
        self.size = next;
        Ok(())
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn staged_path(&self) -> &Path {
        self.temp.path()
    }

    /// Moves the staged file to `<project_path>/<subfolder>/<normalized name>`,
    /// replacing any file already there.
    pub async fn relocate(self, project_path: &Path, kind: ArtifactKind) -> Result<FileMetadata, StagingError> {
        let StagedUpload { temp, mut writer, original_name, .. } = self;
        writer.flush().await?;
        drop(writer);

        let target_dir = project_path.join(kind.subfolder());
        let target = target_dir.join(kind.target_file_name(&original_name));

        let placed = target.clone();
        tokio::task::spawn_blocking(move || place(temp, &target_dir, &placed))
            .await
            .map_err(io::Error::other)??;

        let target = tokio::fs::canonicalize(&target).await?;
        info!("Placed {} upload at {}", kind.field_name(), target.display());
        Ok(file_metadata(&target).await?)
    }
}

fn place(temp: NamedTempFile, target_dir: &Path, target: &Path) -> io::Result<()> {
    std::fs::create_dir_all(target_dir)?;
    match temp.persist(target) {
        Ok(_) => Ok(()),
        Err(e) => {
            // Rename fails across filesystems; copy instead and let the temp file drop.
            debug!("Rename into place failed ({}), copying", e.error);
            std::fs::copy(e.file.path(), target)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_target_names() {
        assert_eq!(ArtifactKind::Installation.target_file_name("guide.pdf"), "installation.pdf");
        assert_eq!(ArtifactKind::Installation.target_file_name("INSTALL"), "installation");
        assert_eq!(ArtifactKind::Readme.target_file_name("readme.md"), "ReadMe.md");
        assert_eq!(ArtifactKind::Readme.target_file_name("README"), "ReadMe.txt");
        assert_eq!(ArtifactKind::Source.target_file_name("code.tar.gz"), "project.zip");
        assert_eq!(ArtifactKind::Source.target_file_name("src"), "project.zip");
    }

    #[tokio::test]
    async fn test_relocate_moves_file_into_subfolder() {
        let temp_dir = TempDir::new().unwrap();
        let staging = temp_dir.path().join("staging");
        let project = temp_dir.path().join("Test_App");

        let mut upload = StagedUpload::create(&staging, "guide.pdf", 1024).unwrap();
        upload.write_chunk(b"0123456789").await.unwrap();
        upload.write_chunk(b"abcde").await.unwrap();
        let staged = upload.staged_path().to_path_buf();

        let meta = upload.relocate(&project, ArtifactKind::Installation).await.unwrap();

        let expected = project.join(INSTALLATION_DIR).join("installation.pdf").canonicalize().unwrap();
        assert_eq!(meta.path, expected.to_string_lossy());
        assert_eq!(meta.name, "installation.pdf");
        assert_eq!(meta.size, 15);
        assert_eq!(std::fs::read(&expected).unwrap(), b"0123456789abcde");
        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn test_relocate_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let project = temp_dir.path().join("p");
        std::fs::create_dir_all(project.join(SOURCE_DIR)).unwrap();
        std::fs::write(project.join(SOURCE_DIR).join("project.zip"), b"old contents").unwrap();

        let mut upload = StagedUpload::create(temp_dir.path(), "code.zip", 1024).unwrap();
        upload.write_chunk(b"new").await.unwrap();
        let meta = upload.relocate(&project, ArtifactKind::Source).await.unwrap();

        assert_eq!(meta.size, 3);
        assert_eq!(std::fs::read(project.join(SOURCE_DIR).join("project.zip")).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_limit_is_enforced_and_temp_removed_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let mut upload = StagedUpload::create(temp_dir.path(), "big.bin", 8).unwrap();
        upload.write_chunk(b"12345").await.unwrap();
        let staged = upload.staged_path().to_path_buf();

        let err = upload.write_chunk(b"6789").await.unwrap_err();
        assert!(matches!(err, StagingError::TooLarge { limit: 8 }));
        assert_eq!(upload.size(), 5);

        drop(upload);
        assert!(!staged.exists());
    }
}
