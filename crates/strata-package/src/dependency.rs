//! Declared dependencies, their scopes and exclusions

use crate::artifact::ArtifactKind;
use crate::coordinate::{ArtifactKey, Coordinate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Visibility classification of a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Compile,
    Runtime,
    Provided,
    System,
    Test,
}

impl Scope {
    pub const ALL: [Scope; 5] = [
        Scope::Compile,
        Scope::Runtime,
        Scope::Provided,
        Scope::System,
        Scope::Test,
    ];

    /// Parse scope text, returning `None` for unknown names
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "compile" => Some(Scope::Compile),
            "runtime" => Some(Scope::Runtime),
            "provided" => Some(Scope::Provided),
            "system" => Some(Scope::System),
            "test" => Some(Scope::Test),
            _ => None,
        }
    }

    /// Parse scope text as declared in a manifest; absent or unknown is `Compile`
    pub fn parse_or_default(text: Option<&str>) -> Self {
        text.and_then(Scope::parse).unwrap_or_default()
    }

    /// The scopes needed to run code: compile and runtime
    pub fn runtime_scopes() -> ScopeSet {
        ScopeSet::of(&[Scope::Compile, Scope::Runtime])
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Compile => "compile",
            Scope::Runtime => "runtime",
            Scope::Provided => "provided",
            Scope::System => "system",
            Scope::Test => "test",
        };
        f.write_str(name)
    }
}

/// Set of scopes a resolution run admits
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScopeSet(u8);

impl ScopeSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn of(scopes: &[Scope]) -> Self {
        scopes.iter().copied().collect()
    }

    pub fn insert(&mut self, scope: Scope) {
        self.0 |= scope.bit();
    }

    pub fn contains(&self, scope: Scope) -> bool {
        self.0 & scope.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Scope> + '_ {
        Scope::ALL.into_iter().filter(|s| self.contains(*s))
    }
}

impl FromIterator<Scope> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = Scope>>(iter: I) -> Self {
        let mut set = ScopeSet::empty();
        for scope in iter {
            set.insert(scope);
        }
        set
    }
}

impl fmt::Debug for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// A dependency declared by a manifest
///
/// The exclusion set applies to everything reachable through this
/// dependency, never to the dependency itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub coordinate: Coordinate,
    pub scope: Scope,
    pub kind: ArtifactKind,
    pub exclusions: BTreeSet<ArtifactKey>,
}

impl Dependency {
    /// A compile-scoped jar dependency with no exclusions
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            scope: Scope::default(),
            kind: ArtifactKind::default(),
            exclusions: BTreeSet::new(),
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_kind(mut self, kind: ArtifactKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_exclusion(mut self, key: ArtifactKey) -> Self {
        self.exclusions.insert(key);
        self
    }

    /// Whether `key` is cut off below this dependency
    pub fn excludes(&self, key: &ArtifactKey) -> bool {
        self.exclusions.contains(key)
    }
}
