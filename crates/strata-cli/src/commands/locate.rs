//! Locate command (strata locate)

use super::{parse_coordinate, parse_kind, parse_signature, Context};
use anyhow::Result;

pub async fn run(
    context: &Context,
    coordinate: &str,
    kind: Option<&str>,
    signature: Option<&str>,
) -> Result<()> {
    let coordinate = parse_coordinate(coordinate)?;
    let kind = parse_kind(kind);
    let signature = signature.map(parse_signature).transpose()?;
    let repository = context.repository(&[])?;

    let locator = repository
        .locate(&coordinate, Some(&kind), signature, false)
        .await?;
    println!("{}", locator);

    Ok(())
}
