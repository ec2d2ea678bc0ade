//! Store an artifact command (strata put)

use super::{parse_coordinate, parse_kind, Context};
use anyhow::{Context as _, Result};
use std::path::Path;

pub async fn run(context: &Context, coordinate: &str, file: &Path, kind: Option<&str>) -> Result<()> {
    let coordinate = parse_coordinate(coordinate)?;
    let kind = parse_kind(kind);
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let repository = context.repository(&[])?;

    let locator = repository
        .write_artifact(&coordinate, &kind, &bytes)
        .await
        .with_context(|| format!("Failed to store {} of {}", kind, coordinate))?;

    tracing::info!(coordinate = %coordinate, %kind, bytes = bytes.len(), "artifact stored");
    println!("Stored {} bytes at {}", bytes.len(), locator);

    Ok(())
}
