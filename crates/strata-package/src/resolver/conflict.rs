//! Version conflicts settled by nearest-wins

use crate::coordinate::{Coordinate, Identity};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;

/// A version of a logical package that lost to the selected one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OmittedVersion {
    pub version: String,
    pub depth: usize,
    /// The entry whose manifest declared the omitted version; `None` for roots
    pub via: Option<Coordinate>,
}

/// Every discarded rediscovery of one identity at a different version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub identity: Identity,
    pub selected: Coordinate,
    pub selected_depth: usize,
    pub omitted: Vec<OmittedVersion>,
}

impl Conflict {
    /// Human-readable report of the conflict
    pub fn report(&self) -> String {
        let mut report = format!(
            "Version conflict for '{}': selected {} (depth {})\n",
            self.identity,
            self.selected.version(),
            self.selected_depth
        );

        for omitted in &self.omitted {
            let _ = match &omitted.via {
                Some(via) => writeln!(
                    report,
                    "  omitted {} (depth {}, via {})",
                    omitted.version, omitted.depth, via
                ),
                None => writeln!(
                    report,
                    "  omitted {} (depth {}, requested as root)",
                    omitted.version, omitted.depth
                ),
            };
        }

        report
    }
}

/// Collects conflicts in the order they were first observed
#[derive(Debug, Default)]
pub(crate) struct ConflictLog {
    conflicts: Vec<Conflict>,
    index: HashMap<Identity, usize>,
}

impl ConflictLog {
    /// Record that `discarded` lost to `selected`; same-version rediscoveries are not conflicts
    pub(crate) fn record(
        &mut self,
        selected: &Coordinate,
        selected_depth: usize,
        discarded: &Coordinate,
        depth: usize,
        via: Option<&Coordinate>,
    ) {
        if selected.version() == discarded.version() {
            return;
        }

        let identity = selected.identity();
        let slot = match self.index.get(&identity) {
            Some(&slot) => slot,
            None => {
                self.conflicts.push(Conflict {
                    identity: identity.clone(),
                    selected: selected.clone(),
                    selected_depth,
                    omitted: Vec::new(),
                });
                self.index.insert(identity, self.conflicts.len() - 1);
                self.conflicts.len() - 1
            }
        };

        let conflict = &mut self.conflicts[slot];
        let omitted = OmittedVersion {
            version: discarded.version().to_string(),
            depth,
            via: via.cloned(),
        };
        if !conflict.omitted.contains(&omitted) {
            conflict.omitted.push(omitted);
        }
    }

    pub(crate) fn into_conflicts(self) -> Vec<Conflict> {
        self.conflicts
    }
}
