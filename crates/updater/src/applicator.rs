use crate::error::{InstallError, Result};
use crate::host::{InstallRequest, PackageHost};
use crate::marker::{ContinuationMarkers, MarkerKind};
use crate::report::{recompile_notice, Notifier, NOTICE_TITLE};
use std::path::Path;
use std::sync::Arc;
use tokio::task;

/// Which cycle branch a batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    /// The batch replaces the updater package.
    SelfUpdate,
    /// The batch replaces ordinary packages.
    Ordinary,
}

impl BatchKind {
    fn marker(self) -> MarkerKind {
        match self {
            BatchKind::SelfUpdate => MarkerKind::SelfUpdated,
            BatchKind::Ordinary => MarkerKind::Updated,
        }
    }
}

/// Hands staged archives to the host and records the continuation marker.
pub struct InstallApplicator<H> {
    host: Arc<H>,
    markers: ContinuationMarkers,
    notifier: Arc<dyn Notifier>,
}

impl<H> InstallApplicator<H>
where
    H: PackageHost,
{
    pub fn new(host: Arc<H>, markers: ContinuationMarkers, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            host,
            markers,
            notifier,
        }
    }

    pub fn markers(&self) -> &ContinuationMarkers {
        &self.markers
    }

    /// Install `batch` as a single host operation.
    ///
    /// The marker is only written once the host accepted the whole batch.
    pub async fn apply(&self, kind: BatchKind, batch: &[InstallRequest]) -> Result<()> {
        let references: Vec<String> = batch.iter().map(InstallRequest::reference).collect();
        tracing::info!(?kind, packages = ?references, "handing batch to package host");

        self.host
            .add_packages(batch)
            .await
            .map_err(InstallError::Rejected)?;

        let marker = kind.marker();
        let markers = self.markers.clone();
        // Perform blocking filesystem work in a dedicated thread.
        let path = task::spawn_blocking(move || markers.write(marker).map(Path::to_path_buf))
            .await
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))
            .and_then(|written| written)
            .map_err(|source| InstallError::Marker {
                path: self.markers.path(marker).to_path_buf(),
                source,
            })?;
        tracing::debug!(%marker, path = %path.display(), "wrote continuation marker");

        if kind == BatchKind::Ordinary {
            self.notifier.notice(NOTICE_TITLE, recompile_notice());
        }

        Ok(())
    }
}
