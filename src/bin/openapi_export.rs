//! Print the OpenAPI document to stdout: `cargo run --bin openapi_export > openapi.json`

use anyhow::{Context, Result};
use utoipa::OpenApi;

use boiler::api::openapi::ApiDoc;

fn main() -> Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("Failed to serialize OpenAPI document")?;
    println!("{}", json);
    Ok(())
}
