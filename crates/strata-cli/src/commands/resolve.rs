//! Resolve command (strata resolve)

use super::{parse_coordinates, Context};
use anyhow::{Context as _, Result};
use strata_package::CachedResolution;

pub async fn run(context: &Context, coordinates: &[String], scopes: &[String], json: bool) -> Result<()> {
    let roots = parse_coordinates(coordinates)?;
    let repository = context.repository(scopes)?;

    let cached = repository
        .classpath(&roots)
        .await
        .context("Failed to resolve dependencies")?;

    for conflict in &cached.resolution.conflicts {
        eprintln!("{}", conflict.report());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&*cached)?);
    } else {
        print!("{}", render(&cached));
    }

    Ok(())
}

/// One `depth  coordinate  locator` line per classpath entry
fn render(cached: &CachedResolution) -> String {
    let width = cached
        .classpath
        .iter()
        .map(|e| e.coordinate.to_string().len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (resolved, entry) in cached.resolution.iter().zip(cached.classpath.iter()) {
        out.push_str(&format!(
            "{:>3}  {:<width$}  {}\n",
            resolved.depth,
            entry.coordinate.to_string(),
            entry.locator,
            width = width
        ));
    }
    out
}
