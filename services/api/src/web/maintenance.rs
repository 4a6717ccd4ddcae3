//! services/api/src/web/maintenance.rs
//!
//! Administrative endpoints: legacy folder migration and store compaction.

use crate::storage::run_legacy_migration;
use crate::web::{
    response::{ErrorBody, HandlerError},
    state::AppState,
};
use axum::{extract::State, response::Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResponse {
    success: bool,
    updated_count: usize,
    message: String,
}

#[derive(Serialize, ToSchema)]
pub struct CompactResponse {
    success: bool,
}

/// Upgrade project folders created with the old layout.
#[utoipa::path(
    post,
    path = "/api/update-existing-folders",
    responses(
        (status = 200, description = "Number of projects that were changed", body = MigrationResponse),
        (status = 500, description = "The store could not be read", body = ErrorBody)
    )
)]
pub async fn update_existing_folders_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<MigrationResponse>, HandlerError> {
    let updated_count = run_legacy_migration(app_state.store.as_ref()).await?;
    Ok(Json(MigrationResponse {
        success: true,
        updated_count,
        message: format!("Updated {} project folders", updated_count),
    }))
}

/// Rewrite the record store file.
#[utoipa::path(
    post,
    path = "/api/compact-database",
    responses(
        (status = 200, description = "Store rewritten", body = CompactResponse),
        (status = 500, description = "Store could not be written", body = ErrorBody)
    )
)]
pub async fn compact_database_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<CompactResponse>, HandlerError> {
    app_state.store.compact().await?;
    Ok(Json(CompactResponse { success: true }))
}
