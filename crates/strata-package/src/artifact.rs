//! Artifact and signature kinds stored alongside each coordinate

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of artifact stored for a coordinate
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Packaged code, the default for dependencies that declare no type
    #[default]
    Jar,
    /// Source archive (`-sources.jar`)
    Source,
    /// The manifest describing the coordinate and its dependencies
    Manifest,
    /// Version-independent metadata for a `(group, artifact)` pair
    Metadata,
    /// Any other declared type; the text doubles as the file extension
    Other(String),
}

impl ArtifactKind {
    /// Map a dependency's declared type text onto a kind.
    ///
    /// Absent or empty text yields [`ArtifactKind::Jar`].
    pub fn from_type(text: Option<&str>) -> Self {
        let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
            return ArtifactKind::Jar;
        };

        match text.to_ascii_lowercase().as_str() {
            "jar" => ArtifactKind::Jar,
            "source" | "sources" => ArtifactKind::Source,
            "pom" | "manifest" => ArtifactKind::Manifest,
            "metadata" => ArtifactKind::Metadata,
            other => ArtifactKind::Other(other.to_string()),
        }
    }

    /// File extension used by the store layout
    pub fn extension(&self) -> &str {
        match self {
            ArtifactKind::Jar | ArtifactKind::Source => "jar",
            ArtifactKind::Manifest | ArtifactKind::Metadata => "toml",
            ArtifactKind::Other(ext) => ext,
        }
    }

    /// Whether the stored file depends on the version (metadata does not)
    pub fn is_versioned(&self) -> bool {
        !matches!(self, ArtifactKind::Metadata)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Jar => write!(f, "jar"),
            ArtifactKind::Source => write!(f, "source"),
            ArtifactKind::Manifest => write!(f, "manifest"),
            ArtifactKind::Metadata => write!(f, "metadata"),
            ArtifactKind::Other(kind) => write!(f, "{}", kind),
        }
    }
}

/// Detached signature stored next to an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureKind {
    Md5,
    Sha1,
    Pgp,
}

impl SignatureKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            SignatureKind::Md5 => ".md5",
            SignatureKind::Sha1 => ".sha1",
            SignatureKind::Pgp => ".asc",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "md5" => Some(SignatureKind::Md5),
            "sha1" => Some(SignatureKind::Sha1),
            "pgp" | "asc" => Some(SignatureKind::Pgp),
            _ => None,
        }
    }
}
