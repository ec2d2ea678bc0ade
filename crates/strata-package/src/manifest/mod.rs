//! Manifest parsing: declared identity and direct dependencies

mod document;

pub use document::{Element, ManifestDecoder, TomlDecoder};

use crate::artifact::ArtifactKind;
use crate::coordinate::{ArtifactKey, Coordinate};
use crate::dependency::{Dependency, Scope};
use crate::store::layout;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("Malformed manifest: {0}")]
    Malformed(String),

    #[error("Manifest for {requested} declares no {field}")]
    MissingIdentity {
        requested: Coordinate,
        field: &'static str,
    },

    #[error("Manifest identity mismatch: requested {requested}, manifest declares {declared}")]
    IdentityMismatch {
        requested: Coordinate,
        declared: Coordinate,
    },
}

/// A dependency or exclusion entry that was dropped while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkippedEntry {
    /// Dependency at `index` lacked or had an invalid identifier
    Dependency { index: usize, reason: String },
    /// Exclusion at `index` under dependency `dependency` lacked group or artifact
    Exclusion { dependency: usize, index: usize },
}

/// Parsed manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub identity: Coordinate,
    /// Every declared dependency, in declaration order, regardless of scope
    pub dependencies: Vec<Dependency>,
    pub skipped: Vec<SkippedEntry>,
}

/// Parse a decoded manifest document fetched for `requested`.
///
/// Partial dependency and exclusion entries are skipped; a missing or
/// mismatched project identity fails the whole manifest.
pub fn parse(requested: &Coordinate, root: &Element) -> Result<Manifest, ManifestError> {
    let project = root
        .child("project")
        .ok_or_else(|| ManifestError::Malformed(format!("no project section for {}", requested)))?;

    let identity = declared_identity(requested, project)?;
    if &identity != requested {
        return Err(ManifestError::IdentityMismatch {
            requested: requested.clone(),
            declared: identity,
        });
    }

    let mut dependencies = Vec::new();
    let mut skipped = Vec::new();

    for (index, entry) in root.children_named("dependency").enumerate() {
        match parse_dependency(entry) {
            Ok(mut dependency) => {
                for (ex_index, exclusion) in entry.children_named("exclusion").enumerate() {
                    match (exclusion.child_text("group"), exclusion.child_text("artifact")) {
                        (Some(group), Some(artifact)) => {
                            dependency = dependency.with_exclusion(ArtifactKey::new(group, artifact));
                        }
                        _ => {
                            tracing::debug!(
                                coordinate = %requested,
                                dependency = index,
                                exclusion = ex_index,
                                "skipping exclusion without group or artifact"
                            );
                            skipped.push(SkippedEntry::Exclusion {
                                dependency: index,
                                index: ex_index,
                            });
                        }
                    }
                }
                dependencies.push(dependency);
            }
            Err(reason) => {
                tracing::debug!(
                    coordinate = %requested,
                    dependency = index,
                    %reason,
                    "skipping incomplete dependency"
                );
                skipped.push(SkippedEntry::Dependency { index, reason });
            }
        }
    }

    Ok(Manifest {
        identity,
        dependencies,
        skipped,
    })
}

fn declared_identity(requested: &Coordinate, project: &Element) -> Result<Coordinate, ManifestError> {
    let field = |name: &'static str| {
        project
            .child_text(name)
            .ok_or_else(|| ManifestError::MissingIdentity {
                requested: requested.clone(),
                field: name,
            })
    };

    let group = field("group")?;
    let artifact = field("artifact")?;
    let version = field("version")?;

    let invalid = |e: crate::coordinate::CoordinateError| {
        ManifestError::Malformed(format!("invalid project identity: {}", e))
    };
    let mut identity = Coordinate::new(group, artifact, version).map_err(invalid)?;
    if let Some(classifier) = project.child_text("classifier") {
        identity = identity.with_classifier(classifier).map_err(invalid)?;
    }
    Ok(identity)
}

fn parse_dependency(entry: &Element) -> Result<Dependency, String> {
    let missing: Vec<&str> = ["group", "artifact", "version"]
        .into_iter()
        .filter(|name| entry.child_text(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(format!("missing {}", missing.join(", ")));
    }

    let text = |name: &str| entry.child_text(name).unwrap_or_default();
    let mut coordinate =
        Coordinate::new(text("group"), text("artifact"), text("version")).map_err(|e| e.to_string())?;
    if let Some(classifier) = entry.child_text("classifier") {
        coordinate = coordinate
            .with_classifier(classifier)
            .map_err(|e| e.to_string())?;
    }

    let kind = ArtifactKind::from_type(entry.child_text("type"));
    if let ArtifactKind::Other(ext) = &kind {
        if !layout::is_valid_extension(ext) {
            return Err(format!("invalid type '{}'", ext));
        }
    }

    Ok(Dependency::new(coordinate)
        .with_scope(Scope::parse_or_default(entry.child_text("scope")))
        .with_kind(kind))
}
