//! Continuation markers surviving a host restart.
//!
//! Only the existence of a marker is meaningful. Startup logic outside this
//! crate reads and clears them.

use crate::config::UpdaterConfig;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// The updater package itself was replaced; re-run a full cycle after restart.
    SelfUpdated,
    /// Other packages were replaced; tell the user once recompilation finishes.
    Updated,
}

impl MarkerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelfUpdated => "self-updated",
            Self::Updated => "updated",
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The two well-known marker locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationMarkers {
    self_updated: PathBuf,
    updated: PathBuf,
}

impl ContinuationMarkers {
    pub fn new(self_updated: impl Into<PathBuf>, updated: impl Into<PathBuf>) -> Self {
        Self {
            self_updated: self_updated.into(),
            updated: updated.into(),
        }
    }

    pub fn from_config(config: &UpdaterConfig) -> Self {
        Self::new(config.self_updated_marker(), config.updated_marker())
    }

    pub fn path(&self, kind: MarkerKind) -> &Path {
        match kind {
            MarkerKind::SelfUpdated => &self.self_updated,
            MarkerKind::Updated => &self.updated,
        }
    }

    /// Create the marker. Writing an existing marker is a no-op.
    pub fn write(&self, kind: MarkerKind) -> std::io::Result<&Path> {
        let path = self.path(kind);
        fs::create_dir_all(path)?;
        Ok(path)
    }

    pub fn is_present(&self, kind: MarkerKind) -> bool {
        self.path(kind).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn markers_are_independent_and_idempotent() {
        let dir = tempdir().unwrap();
        let config = UpdaterConfig::new(dir.path());
        let markers = ContinuationMarkers::from_config(&config);

        assert!(!markers.is_present(MarkerKind::SelfUpdated));
        assert!(!markers.is_present(MarkerKind::Updated));

        markers.write(MarkerKind::Updated).unwrap();
        markers.write(MarkerKind::Updated).unwrap();

        assert!(markers.is_present(MarkerKind::Updated));
        assert!(!markers.is_present(MarkerKind::SelfUpdated));
        assert_eq!(
            markers.path(MarkerKind::Updated),
            dir.path().join("Temp").join("vrcfUpdated")
        );
    }
}
