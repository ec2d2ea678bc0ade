//! Existence check command (strata exists)

use super::{parse_coordinates, Context};
use anyhow::Result;

/// Print each coordinate's presence; returns whether all of them exist
pub async fn run(context: &Context, coordinates: &[String]) -> Result<bool> {
    let coordinates = parse_coordinates(coordinates)?;
    let repository = context.repository(&[])?;

    let present = repository.exists_any(&coordinates).await?;

    let mut all_present = true;
    for coordinate in &coordinates {
        if present.contains(coordinate) {
            println!("present  {}", coordinate);
        } else {
            println!("missing  {}", coordinate);
            all_present = false;
        }
    }

    Ok(all_present)
}
