//! Package coordinates and the keys derived from them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Coordinate validation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordinateError {
    #[error("Missing required identifier: {0}")]
    Missing(&'static str),

    #[error("Invalid {field} '{value}': {reason}")]
    Invalid {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Malformed coordinate '{0}': expected group:artifact:version[:classifier]")]
    Malformed(String),
}

/// Identity of one package version: `group:artifact:version[:classifier]`
///
/// Equality, hashing and ordering are structural over all four fields. A
/// coordinate without a classifier never equals one with a classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinate {
    group: String,
    artifact: String,
    version: String,
    classifier: Option<String>,
}

impl Coordinate {
    /// Create a coordinate without a classifier
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self, CoordinateError> {
        let group = validate_group(validate("group", group.into())?)?;
        let artifact = validate("artifact", artifact.into())?;
        let version = validate("version", version.into())?;
        Ok(Self {
            group,
            artifact,
            version,
            classifier: None,
        })
    }

    /// Return a copy of this coordinate carrying the given classifier
    pub fn with_classifier(self, classifier: impl Into<String>) -> Result<Self, CoordinateError> {
        let classifier = validate("classifier", classifier.into())?;
        Ok(Self {
            classifier: Some(classifier),
            ..self
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    /// Version-agnostic `(group, artifact)` key used by exclusions
    pub fn artifact_key(&self) -> ArtifactKey {
        ArtifactKey {
            group: self.group.clone(),
            artifact: self.artifact.clone(),
        }
    }

    /// `(group, artifact, classifier)` key used for conflict resolution
    pub fn identity(&self) -> Identity {
        Identity {
            group: self.group.clone(),
            artifact: self.artifact.clone(),
            classifier: self.classifier.clone(),
        }
    }

    /// The coordinate whose manifest describes this one.
    ///
    /// Manifests are stored once per version; classified artifacts share it.
    pub fn manifest_coordinate(&self) -> Coordinate {
        Self {
            classifier: None,
            ..self.clone()
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        Ok(())
    }
}

impl FromStr for Coordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            [group, artifact, version] => Coordinate::new(*group, *artifact, *version),
            [group, artifact, version, classifier] => {
                Coordinate::new(*group, *artifact, *version)?.with_classifier(*classifier)
            }
            _ => Err(CoordinateError::Malformed(s.to_string())),
        }
    }
}

impl TryFrom<String> for Coordinate {
    type Error = CoordinateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Coordinate> for String {
    fn from(coordinate: Coordinate) -> Self {
        coordinate.to_string()
    }
}

/// `(group, artifact)` pair, the unit of exclusion
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactKey {
    pub group: String,
    pub artifact: String,
}

impl ArtifactKey {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

/// `(group, artifact, classifier)`: one logical package regardless of version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity {
    pub group: String,
    pub artifact: String,
    pub classifier: Option<String>,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        Ok(())
    }
}

/// Each '.'-separated group segment becomes one store directory
fn validate_group(group: String) -> Result<String, CoordinateError> {
    if group.split('.').any(str::is_empty) {
        return Err(CoordinateError::Invalid {
            field: "group",
            value: group,
            reason: "must not contain empty '.'-separated segments",
        });
    }
    Ok(group)
}

fn validate(field: &'static str, value: String) -> Result<String, CoordinateError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoordinateError::Missing(field));
    }

    if trimmed.contains([':', '/', '\\']) {
        return Err(CoordinateError::Invalid {
            field,
            value: trimmed.to_string(),
            reason: "must not contain ':', '/' or '\\'",
        });
    }

    if trimmed.chars().any(char::is_whitespace) {
        return Err(CoordinateError::Invalid {
            field,
            value: trimmed.to_string(),
            reason: "must not contain whitespace",
        });
    }

    if trimmed == "." || trimmed == ".." {
        return Err(CoordinateError::Invalid {
            field,
            value: trimmed.to_string(),
            reason: "must not be a relative path segment",
        });
    }

    Ok(trimmed.to_string())
}
