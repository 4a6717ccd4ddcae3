//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document of the submission API to disk.
//! Usage: `openapi [output-path]` (defaults to `openapi.json`).

use submission_api::web::rest::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());

    let document = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(&path, document)?;
    println!("OpenAPI document for {} routes written to {}", ApiDoc::openapi().paths.paths.len(), path);
    Ok(())
}
