//! Ordered artifact list handed to a loading mechanism

use crate::artifact::ArtifactKind;
use crate::coordinate::Coordinate;
use crate::resolver::Resolution;
use crate::store::{Locator, StoreClient, StoreResult};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClasspathEntry {
    pub coordinate: Coordinate,
    pub kind: ArtifactKind,
    pub locator: Locator,
}

/// Resolved artifacts in resolution order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Classpath {
    entries: Vec<ClasspathEntry>,
}

impl Classpath {
    /// Locate the artifact of every resolved entry; no content is read
    pub async fn assemble(store: &dyn StoreClient, resolution: &Resolution) -> StoreResult<Self> {
        let mut entries = Vec::with_capacity(resolution.len());
        for entry in resolution {
            let locator = store
                .locate(&entry.coordinate, Some(&entry.kind), None, false)
                .await?;
            entries.push(ClasspathEntry {
                coordinate: entry.coordinate.clone(),
                kind: entry.kind.clone(),
                locator,
            });
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClasspathEntry> {
        self.entries.iter()
    }

    pub fn locators(&self) -> impl Iterator<Item = &Locator> {
        self.entries.iter().map(|e| &e.locator)
    }
}

impl FromIterator<ClasspathEntry> for Classpath {
    fn from_iter<I: IntoIterator<Item = ClasspathEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Classpath {
    type Item = &'a ClasspathEntry;
    type IntoIter = std::slice::Iter<'a, ClasspathEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
