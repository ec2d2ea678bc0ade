//! Repository path layout shared by the bundled stores
//!
//! ```text
//! /org/example/app/1.0/                  version directory
//! /org/example/app/1.0/app-1.0.jar       packaged code
//! /org/example/app/1.0/app-1.0-linux.jar classified packaged code
//! /org/example/app/1.0/app-1.0-sources.jar
//! /org/example/app/1.0/app-1.0.toml      manifest
//! /org/example/app/metadata.toml         per-artifact metadata
//! ```
//!
//! Signatures append `.md5`, `.sha1` or `.asc` to the artifact path.

use super::{StoreError, StoreResult};
use crate::artifact::{ArtifactKind, SignatureKind};
use crate::coordinate::Coordinate;

/// Store-relative path for an artifact, or for the version directory when `kind` is `None`
pub fn path(
    coordinate: &Coordinate,
    kind: Option<&ArtifactKind>,
    signature: Option<SignatureKind>,
) -> StoreResult<String> {
    let artifact_dir = format!(
        "/{}/{}",
        coordinate.group().replace('.', "/"),
        coordinate.artifact()
    );

    let Some(kind) = kind else {
        return Ok(format!("{}/{}/", artifact_dir, coordinate.version()));
    };

    if let ArtifactKind::Other(ext) = kind {
        if !is_valid_extension(ext) {
            return Err(StoreError::InvalidCoordinate(format!(
                "artifact type '{}' of {} is not a valid file extension",
                ext, coordinate
            )));
        }
    }

    let signature = signature.map(|s| s.suffix()).unwrap_or("");

    let file = match kind {
        ArtifactKind::Metadata => {
            return Ok(format!("{}/metadata.{}{}", artifact_dir, kind.extension(), signature));
        }
        ArtifactKind::Manifest => format!(
            "{}-{}.{}",
            coordinate.artifact(),
            coordinate.version(),
            kind.extension()
        ),
        ArtifactKind::Source => format!(
            "{}-sources.{}",
            base_name(coordinate),
            kind.extension()
        ),
        ArtifactKind::Jar | ArtifactKind::Other(_) => {
            format!("{}.{}", base_name(coordinate), kind.extension())
        }
    };

    Ok(format!(
        "{}/{}/{}{}",
        artifact_dir,
        coordinate.version(),
        file,
        signature
    ))
}

/// Extensions must be a single, plain path component
pub fn is_valid_extension(ext: &str) -> bool {
    !ext.is_empty()
        && !ext.starts_with('.')
        && ext
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

fn base_name(coordinate: &Coordinate) -> String {
    match coordinate.classifier() {
        Some(classifier) => format!(
            "{}-{}-{}",
            coordinate.artifact(),
            coordinate.version(),
            classifier
        ),
        None => format!("{}-{}", coordinate.artifact(), coordinate.version()),
    }
}
