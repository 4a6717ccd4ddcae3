//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the project endpoints and the master
//! definition for the OpenAPI specification.

use crate::storage::{complete_project, create_project_structure, ensure_student_info, CompletionRequest};
use crate::web::{
    downloads, maintenance,
    response::{required, ErrorBody, HandlerError},
    state::AppState,
    uploads,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use submission_core::domain::{FileMetadata, ProjectRecord, SearchField, StoreStats, TeamMember};
use tracing::info;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        location_preference_handler,
        create_project_handler,
        complete_project_handler,
        search_handler,
        list_projects_handler,
        get_project_handler,
        stats_handler,
        health_handler,
        uploads::upload_readme_handler,
        uploads::upload_installation_handler,
        uploads::upload_source_handler,
        downloads::download_file_handler,
        downloads::download_project_handler,
        maintenance::update_existing_folders_handler,
        maintenance::compact_database_handler,
    ),
    components(
        schemas(
            LocationPreferenceRequest, LocationPreferenceResponse,
            CreateProjectRequest, CreateProjectResponse,
            CompleteProjectRequest, ProjectResponse, ProjectListResponse,
            StatsResponse, HealthResponse, ErrorBody,
            uploads::ReadmeUploadResponse, uploads::InstallationUploadResponse,
            uploads::SourceUploadResponse,
            maintenance::MigrationResponse, maintenance::CompactResponse,
        )
    ),
    tags(
        (name = "Project Submission API", description = "Endpoints for submitting, searching and downloading student projects.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationPreferenceRequest {
    use_default: Option<bool>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationPreferenceResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    needs_folder_picker: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    project_name: Option<String>,
    save_path: Option<String>,
    #[schema(value_type = Option<Vec<Object>>)]
    team_members: Option<Vec<TeamMember>>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectResponse {
    success: bool,
    project_path: String,
    folder_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    student_info_path: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteProjectRequest {
    project_name: Option<String>,
    #[schema(value_type = Option<Vec<Object>>)]
    team_members: Option<Vec<TeamMember>>,
    project_path: Option<String>,
    folder_name: Option<String>,
    #[schema(value_type = Option<Object>)]
    readme_file: Option<FileMetadata>,
    #[schema(value_type = Option<Object>)]
    installation_file: Option<FileMetadata>,
    #[schema(value_type = Option<Object>)]
    source_file: Option<FileMetadata>,
}

#[derive(Serialize, ToSchema)]
pub struct ProjectResponse {
    success: bool,
    #[schema(value_type = Object)]
    project: ProjectRecord,
}

#[derive(Serialize, ToSchema)]
pub struct ProjectListResponse {
    success: bool,
    #[schema(value_type = Vec<Object>)]
    projects: Vec<ProjectRecord>,
}

#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    success: bool,
    #[schema(value_type = Object)]
    stats: StoreStats,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    success: bool,
    status: String,
    projects: usize,
}

#[derive(Deserialize)]
pub struct SearchParams {
    query: Option<String>,
    #[serde(rename = "type")]
    search_type: Option<String>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Choose between the default save location and a custom one.
#[utoipa::path(
    post,
    path = "/api/location-preference",
    request_body = LocationPreferenceRequest,
    responses(
        (status = 200, description = "Default path, or a request to pick a folder", body = LocationPreferenceResponse),
        (status = 400, description = "useDefault missing", body = ErrorBody),
        (status = 500, description = "Default location could not be created", body = ErrorBody)
    )
)]
pub async fn location_preference_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<LocationPreferenceRequest>, JsonRejection>,
) -> Result<Json<LocationPreferenceResponse>, HandlerError> {
    let Json(req) = payload?;
    let use_default = req
        .use_default
        .ok_or_else(|| HandlerError::BadRequest("useDefault is required".to_string()))?;

    if !use_default {
        return Ok(Json(LocationPreferenceResponse {
            success: true,
            path: None,
            needs_folder_picker: Some(true),
        }));
    }

    let root = &app_state.config.default_save_root;
    tokio::fs::create_dir_all(root).await?;
    let path = tokio::fs::canonicalize(root).await?;

    Ok(Json(LocationPreferenceResponse {
        success: true,
        path: Some(path.to_string_lossy().into_owned()),
        needs_folder_picker: None,
    }))
}

/// Create the folder skeleton for a new project.
#[utoipa::path(
    post,
    path = "/api/create-project",
    request_body = CreateProjectRequest,
    responses(
        (status = 200, description = "Folder structure created", body = CreateProjectResponse),
        (status = 400, description = "projectName missing", body = ErrorBody),
        (status = 500, description = "Folder could not be created", body = ErrorBody)
    )
)]
pub async fn create_project_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Result<Json<CreateProjectResponse>, HandlerError> {
    let Json(req) = payload?;
    let project_name = required(req.project_name, "projectName")?;
    let base = req
        .save_path
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| app_state.config.default_save_root.clone());

    let folder = create_project_structure(&base, &project_name).await?;

    let team_members = req.team_members.unwrap_or_default();
    let student_info_path = if team_members.is_empty() {
        None
    } else {
        let meta = ensure_student_info(&folder.path, &project_name, &team_members).await?;
        Some(meta.path)
    };

    info!("Created project '{}' at {}", project_name, folder.path.display());
    Ok(Json(CreateProjectResponse {
        success: true,
        project_path: folder.path.to_string_lossy().into_owned(),
        folder_name: folder.folder_name,
        student_info_path,
    }))
}

/// Finalize a project: store its record and write the sidecar file.
#[utoipa::path(
    post,
    path = "/api/complete-project",
    request_body = CompleteProjectRequest,
    responses(
        (status = 200, description = "Project recorded", body = ProjectResponse),
        (status = 400, description = "Required field missing", body = ErrorBody),
        (status = 404, description = "Project folder missing", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn complete_project_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<CompleteProjectRequest>, JsonRejection>,
) -> Result<Json<ProjectResponse>, HandlerError> {
    let Json(req) = payload?;
    let project_name = required(req.project_name, "projectName")?;
    let team_members = req
        .team_members
        .filter(|members| !members.is_empty())
        .ok_or_else(|| HandlerError::BadRequest("teamMembers is required".to_string()))?;
    let project_path = required(req.project_path, "projectPath")?;

    let request = CompletionRequest {
        project_name,
        team_members,
        project_path: PathBuf::from(project_path),
        folder_name: req.folder_name,
        readme_file: req.readme_file,
        installation_file: req.installation_file,
        source_file: req.source_file,
    };

    let project = complete_project(
        app_state.store.as_ref(),
        app_state.match_policy.as_ref(),
        request,
    )
    .await?;

    Ok(Json(ProjectResponse { success: true, project }))
}

/// Search stored projects by substring.
#[utoipa::path(
    get,
    path = "/api/search",
    params(
        ("query" = Option<String>, Query, description = "Case-insensitive substring."),
        ("type" = Option<String>, Query, description = "projectName, teamMember, studentId, folderName or all.")
    ),
    responses(
        (status = 200, description = "Matching projects", body = ProjectListResponse),
        (status = 400, description = "Unknown search type or malformed query string", body = ErrorBody)
    )
)]
pub async fn search_handler(
    State(app_state): State<Arc<AppState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<ProjectListResponse>, HandlerError> {
    let Query(params) = params?;
    let field = match params.search_type.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(raw.parse::<SearchField>().map_err(HandlerError::BadRequest)?),
    };
    let query = params.query.unwrap_or_default();

    let projects = app_state.store.search(&query, field).await?;
    Ok(Json(ProjectListResponse { success: true, projects }))
}

/// List every stored project.
#[utoipa::path(
    get,
    path = "/api/projects",
    responses((status = 200, description = "All projects in insertion order", body = ProjectListResponse))
)]
pub async fn list_projects_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<ProjectListResponse>, HandlerError> {
    let projects = app_state.store.get_all().await?;
    Ok(Json(ProjectListResponse { success: true, projects }))
}

/// Fetch one project by id.
#[utoipa::path(
    get,
    path = "/api/project/{id}",
    params(("id" = String, Path, description = "The project id.")),
    responses(
        (status = 200, description = "The project", body = ProjectResponse),
        (status = 404, description = "Unknown id", body = ErrorBody)
    )
)]
pub async fn get_project_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProjectResponse>, HandlerError> {
    let project = app_state.store.get_by_id(&id).await?;
    Ok(Json(ProjectResponse { success: true, project }))
}

/// Usage statistics over the record store.
#[utoipa::path(
    get,
    path = "/api/stats",
    responses((status = 200, description = "Aggregate counts", body = StatsResponse))
)]
pub async fn stats_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, HandlerError> {
    let stats = app_state.store.stats().await?;
    Ok(Json(StatsResponse { success: true, stats }))
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let stats = app_state.store.stats().await?;
    Ok((
        StatusCode::OK,
        Json(HealthResponse {
            success: true,
            status: "ok".to_string(),
            projects: stats.total_projects,
        }),
    ))
}
