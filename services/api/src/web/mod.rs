pub mod downloads;
pub mod maintenance;
pub mod response;
pub mod rest;
pub mod state;
pub mod uploads;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub use response::HandlerError;
pub use state::AppState;

/// Headroom on top of the per-file cap for multipart framing and text fields.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Builds the API router plus static file serving for the portal front-end.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let body_limit = usize::try_from(app_state.config.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);
    let static_files = ServeDir::new(&app_state.config.public_dir);

    Router::new()
        .route("/api/location-preference", post(rest::location_preference_handler))
        .route("/api/create-project", post(rest::create_project_handler))
        .route("/api/upload-readme", post(uploads::upload_readme_handler))
        .route("/api/upload-installation", post(uploads::upload_installation_handler))
        .route("/api/upload-source", post(uploads::upload_source_handler))
        .route("/api/complete-project", post(rest::complete_project_handler))
        .route("/api/search", get(rest::search_handler))
        .route("/api/projects", get(rest::list_projects_handler))
        .route("/api/project/{id}", get(rest::get_project_handler))
        .route("/api/download/{project_id}/{file_type}", get(downloads::download_file_handler))
        .route("/api/download-project/{project_id}", get(downloads::download_project_handler))
        .route("/api/stats", get(rest::stats_handler))
        .route("/api/health", get(rest::health_handler))
        .route("/api/update-existing-folders", post(maintenance::update_existing_folders_handler))
        .route("/api/compact-database", post(maintenance::compact_database_handler))
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
