//! services/api/src/web/uploads.rs
//!
//! Multipart upload endpoints, one per artifact kind. Each request carries one
//! file field named after the artifact and a `projectPath` text field.

use crate::storage::{ArtifactKind, StagedUpload};
use crate::web::{
    response::{required, ErrorBody, HandlerError},
    state::AppState,
};
use axum::{
    extract::{Multipart, State},
    response::Json,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use submission_core::domain::FileMetadata;
use utoipa::ToSchema;

//=========================================================================================
// Response Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadmeUploadResponse {
    success: bool,
    readme_path: String,
    file_name: String,
    file_size: u64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallationUploadResponse {
    success: bool,
    install_path: String,
    file_name: String,
    file_size: u64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceUploadResponse {
    success: bool,
    source_path: String,
    file_name: String,
    file_size: u64,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Upload the project README.
#[utoipa::path(
    post,
    path = "/api/upload-readme",
    request_body(content_type = "multipart/form-data", description = "File field `readme` and text field `projectPath`."),
    responses(
        (status = 200, description = "README placed in 2.README", body = ReadmeUploadResponse),
        (status = 400, description = "File or projectPath missing", body = ErrorBody),
        (status = 413, description = "File too large", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn upload_readme_handler(
    State(app_state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ReadmeUploadResponse>, HandlerError> {
    let meta = receive_upload(&app_state, multipart, ArtifactKind::Readme).await?;
    Ok(Json(ReadmeUploadResponse {
        success: true,
        readme_path: meta.path,
        file_name: meta.name,
        file_size: meta.size,
    }))
}

/// Upload the installation guide.
#[utoipa::path(
    post,
    path = "/api/upload-installation",
    request_body(content_type = "multipart/form-data", description = "File field `installation` and text field `projectPath`."),
    responses(
        (status = 200, description = "Guide placed in 1.INSTALLATION", body = InstallationUploadResponse),
        (status = 400, description = "File or projectPath missing", body = ErrorBody),
        (status = 413, description = "File too large", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn upload_installation_handler(
    State(app_state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<InstallationUploadResponse>, HandlerError> {
    let meta = receive_upload(&app_state, multipart, ArtifactKind::Installation).await?;
    Ok(Json(InstallationUploadResponse {
        success: true,
        install_path: meta.path,
        file_name: meta.name,
        file_size: meta.size,
    }))
}

/// Upload the source code archive. It is always stored as `project.zip`.
#[utoipa::path(
    post,
    path = "/api/upload-source",
    request_body(content_type = "multipart/form-data", description = "File field `source` and text field `projectPath`."),
    responses(
        (status = 200, description = "Archive placed in 3.SOURCE", body = SourceUploadResponse),
        (status = 400, description = "File or projectPath missing", body = ErrorBody),
        (status = 413, description = "File too large", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn upload_source_handler(
    State(app_state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<SourceUploadResponse>, HandlerError> {
    let meta = receive_upload(&app_state, multipart, ArtifactKind::Source).await?;
    Ok(Json(SourceUploadResponse {
        success: true,
        source_path: meta.path,
        file_name: meta.name,
        file_size: meta.size,
    }))
}

/// Streams the artifact field into the staging area, then moves it into the project.
async fn receive_upload(
    app_state: &AppState,
    mut multipart: Multipart,
    kind: ArtifactKind,
) -> Result<FileMetadata, HandlerError> {
    let config = &app_state.config;
    let mut staged: Option<StagedUpload> = None;
    let mut project_path: Option<String> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("projectPath") => project_path = Some(field.text().await?),
            Some(n) if n == kind.field_name() => {
                let original = field.file_name().unwrap_or(kind.field_name()).to_string();
                let mut upload =
                    StagedUpload::create(&config.upload_tmp_dir, &original, config.max_upload_bytes)?;
                while let Some(chunk) = field.chunk().await? {
                    upload.write_chunk(&chunk).await?;
                }
                staged = Some(upload);
            }
            _ => {}
        }
    }

    let project_path = required(project_path, "projectPath")?;
    let upload = staged.ok_or_else(|| {
        HandlerError::BadRequest(format!("No {} file uploaded", kind.field_name()))
    })?;

    Ok(upload.relocate(Path::new(&project_path), kind).await?)
}
