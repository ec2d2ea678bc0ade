//! Direct dependencies command (strata deps)

use super::{parse_coordinate, Context};
use anyhow::{Context as _, Result};

pub async fn run(context: &Context, coordinate: &str, json: bool) -> Result<()> {
    let coordinate = parse_coordinate(coordinate)?;
    let repository = context.repository(&[])?;

    let dependencies = repository
        .get_dependencies(&coordinate)
        .await
        .with_context(|| format!("Failed to read dependencies of {}", coordinate))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dependencies)?);
        return Ok(());
    }

    if dependencies.is_empty() {
        println!("{} has no dependencies.", coordinate);
        return Ok(());
    }

    for dependency in &dependencies {
        let mut line = format!(
            "{}  {}  {}",
            dependency.coordinate, dependency.scope, dependency.kind
        );
        if !dependency.exclusions.is_empty() {
            let excluded: Vec<String> = dependency.exclusions.iter().map(|k| k.to_string()).collect();
            line.push_str(&format!("  excludes {}", excluded.join(", ")));
        }
        println!("{}", line);
    }

    Ok(())
}
