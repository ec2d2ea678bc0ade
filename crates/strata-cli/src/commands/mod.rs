pub mod deps;
pub mod exists;
pub mod locate;
pub mod put;
pub mod resolve;

use anyhow::{anyhow, bail, Context as _, Result};
use std::path::PathBuf;
use std::sync::Arc;
use strata_config::settings::parse_scopes;
use strata_config::Config;
use strata_package::{ArtifactKind, Coordinate, FsStore, Repository, SignatureKind};

/// Shared state for every command: CLI overrides plus loaded configuration
pub struct Context {
    root: Option<PathBuf>,
    config: Config,
}

impl Context {
    pub fn new(root: Option<PathBuf>, config: Config) -> Self {
        Self { root, config }
    }

    /// Open the directory store, optionally restricting the followed scopes
    pub fn repository(&self, scopes: &[String]) -> Result<Repository> {
        let root = match (&self.root, self.config.store_root()) {
            (Some(root), _) => root.clone(),
            (None, Some(root)) => root.to_path_buf(),
            (None, None) => bail!(
                "No store root configured: pass --root, set STRATA_STORE_ROOT, or add [store] root to strata.toml"
            ),
        };

        let mut options = self.config.resolve_options()?;
        if !scopes.is_empty() {
            options = options.with_scopes(parse_scopes(scopes)?);
        }

        tracing::debug!(root = %root.display(), ?options, "opening store");
        Ok(Repository::new(Arc::new(FsStore::new(root)), options))
    }
}

pub fn parse_coordinate(text: &str) -> Result<Coordinate> {
    text.parse()
        .with_context(|| format!("Invalid coordinate '{}'", text))
}

pub fn parse_coordinates(texts: &[String]) -> Result<Vec<Coordinate>> {
    texts.iter().map(|t| parse_coordinate(t)).collect()
}

pub fn parse_kind(text: Option<&str>) -> ArtifactKind {
    ArtifactKind::from_type(text)
}

pub fn parse_signature(text: &str) -> Result<SignatureKind> {
    SignatureKind::parse(text)
        .ok_or_else(|| anyhow!("Unknown signature kind '{}', expected md5, sha1 or pgp", text))
}
