use crate::error::HostError;
use crate::manifest::LocalPackage;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Interface to the host's package manager.
///
/// The orchestrator only ever lists installed packages and adds a batch of
/// local archives; everything else about package state belongs to the host.
#[async_trait]
pub trait PackageHost: Send + Sync {
    /// Enumerate installed packages. Called fresh on every cycle.
    async fn list_installed(&self) -> Result<Vec<LocalPackage>, HostError>;

    /// Install every request as one batch. Either the whole batch lands or
    /// an error is returned.
    async fn add_packages(&self, batch: &[InstallRequest]) -> Result<(), HostError>;
}

/// One staged archive handed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    /// Package identifier.
    pub id: String,
    /// Version the archive contains, as published by the registry.
    pub version: String,
    /// Path of the staged archive.
    pub archive: PathBuf,
}

impl InstallRequest {
    /// Package reference understood by the host, `file:<path>`.
    pub fn reference(&self) -> String {
        file_reference(&self.archive)
    }
}

pub(crate) fn file_reference(path: &Path) -> String {
    format!("file:{}", path.display())
}
