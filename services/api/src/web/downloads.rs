//! services/api/src/web/downloads.rs
//!
//! Streams single artifacts and whole-project ZIP archives back to the client.
//! Archives are built in a scratch file in the upload staging area.

use crate::storage::archive::zip_folder;
use crate::web::{response::HandlerError, state::AppState};
use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use std::sync::Arc;
use submission_core::domain::FileKind;
use tokio_util::io::ReaderStream;
use tracing::info;

/// Download one artifact of a project.
#[utoipa::path(
    get,
    path = "/api/download/{projectId}/{fileType}",
    params(
        ("projectId" = String, Path, description = "The project id."),
        ("fileType" = String, Path, description = "readme, installation, source or studentInfo.")
    ),
    responses(
        (status = 200, description = "The file", content_type = "application/octet-stream"),
        (status = 400, description = "Unknown file type"),
        (status = 404, description = "Project or file not found")
    )
)]
pub async fn download_file_handler(
    State(app_state): State<Arc<AppState>>,
    Path((project_id, file_type)): Path<(String, String)>,
) -> Result<Response, HandlerError> {
    let kind: FileKind = file_type.parse().map_err(HandlerError::BadRequest)?;
    let project = app_state.store.get_by_id(&project_id).await?;
    let meta = project.files.get(kind).ok_or_else(|| {
        HandlerError::NotFound(format!("Project {} has no {} file", project_id, kind))
    })?;

    let file = match tokio::fs::File::open(&meta.path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(HandlerError::NotFound(format!("File not found on disk: {}", meta.name)));
        }
        Err(e) => return Err(e.into()),
    };
    let length = file.metadata().await?.len();

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (header::CONTENT_DISPOSITION, attachment(&meta.name)),
        (header::CONTENT_LENGTH, length.to_string()),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

/// Download the whole project folder as a ZIP archive.
#[utoipa::path(
    get,
    path = "/api/download-project/{projectId}",
    params(("projectId" = String, Path, description = "The project id.")),
    responses(
        (status = 200, description = "ZIP of the project folder", content_type = "application/zip"),
        (status = 404, description = "Project or folder not found")
    )
)]
pub async fn download_project_handler(
    State(app_state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Result<Response, HandlerError> {
    let project = app_state.store.get_by_id(&project_id).await?;
    let folder = PathBuf::from(&project.project_path);
    if !tokio::fs::try_exists(&folder).await? {
        return Err(HandlerError::NotFound(format!(
            "Project folder not found: {}",
            folder.display()
        )));
    }

    let name = if project.folder_name.is_empty() {
        folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| project.id.clone())
    } else {
        project.folder_name.clone()
    };

    let scratch_dir = app_state.config.upload_tmp_dir.clone();
    let archive = tokio::fs::File::from_std(zip_folder(folder, name.clone(), scratch_dir).await?);
    let length = archive.metadata().await?.len();
    info!("Serving archive of project {} ({} bytes)", project.id, length);

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (header::CONTENT_DISPOSITION, attachment(&format!("{}.zip", name))),
        (header::CONTENT_LENGTH, length.to_string()),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(archive))).into_response())
}

/// `attachment; filename="..."` with characters that are not valid in a header replaced.
fn attachment(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
        .filter(|c| *c != '"' && *c != '\\')
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_header_is_ascii() {
        assert_eq!(attachment("ReadMe.md"), "attachment; filename=\"ReadMe.md\"");
        assert_eq!(attachment("Café \"x\".zip"), "attachment; filename=\"Caf_ x.zip\"");
    }
}
