use std::path::PathBuf;

/// Convenient result alias for updater operations.
pub type Result<T> = std::result::Result<T, UpdaterError>;

/// Errors that end an update cycle.
#[derive(thiserror::Error, Debug)]
pub enum UpdaterError {
    /// The package registry could not be fetched or decoded.
    #[error("failed to fetch package registry: {0}")]
    ManifestFetch(#[from] ManifestFetchError),
    /// The host could not list installed packages.
    #[error("failed to list installed packages: {0}")]
    Inventory(#[source] HostError),
    /// A package archive could not be downloaded or staged.
    #[error("failed to download package archive: {0}")]
    Download(#[from] DownloadError),
    /// The host rejected the staged batch, or the continuation marker could not be written.
    #[error("failed to install packages: {0}")]
    Install(#[from] InstallError),
    /// An automated check found a pending self-update.
    #[error(
        "the updater needs to update itself ({installed} -> {available}); run the update manually"
    )]
    AutomatedSelfUpdate {
        /// Version currently installed.
        installed: String,
        /// Version published by the registry.
        available: String,
    },
    /// A configured URL could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl UpdaterError {
    /// Category of this error, for reports and matching.
    pub fn kind(&self) -> ErrorKind {
        match self {
            UpdaterError::ManifestFetch(_) => ErrorKind::ManifestFetch,
            UpdaterError::Inventory(_) => ErrorKind::Inventory,
            UpdaterError::Download(_) => ErrorKind::Download,
            UpdaterError::Install(_) => ErrorKind::Install,
            UpdaterError::AutomatedSelfUpdate { .. } => ErrorKind::AutomatedSelfUpdate,
            UpdaterError::InvalidUrl(_) | UpdaterError::Other(_) => ErrorKind::Other,
        }
    }
}

/// Flat classification of [`UpdaterError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ManifestFetch,
    Inventory,
    Download,
    Install,
    AutomatedSelfUpdate,
    Other,
}

/// Failures of the registry request.
#[derive(thiserror::Error, Debug)]
pub enum ManifestFetchError {
    /// Network failure, timeout or non-2xx status.
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The payload was not a registry document.
    #[error("registry document is malformed: {0}")]
    Decode(#[from] serde_json::Error),
    /// The payload decoded but listed no packages.
    #[error("registry document contains no packages")]
    MissingPackages,
}

/// Failures while staging an archive.
#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    /// Network failure, timeout or non-2xx status.
    #[error("archive request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Writing to the staging area failed.
    #[error("failed to stage archive: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while handing a batch to the host.
#[derive(thiserror::Error, Debug)]
pub enum InstallError {
    /// The host package manager rejected the batch.
    #[error("package host rejected the batch: {0}")]
    Rejected(#[source] HostError),
    /// The batch landed but the continuation marker could not be written.
    #[error("failed to write continuation marker {path:?}: {source}")]
    Marker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors reported by the host package manager.
#[derive(thiserror::Error, Debug)]
pub enum HostError {
    /// Generic wrapper introduced by the host's dispatch layer; the real
    /// failure is the source.
    #[error("package host invocation failed")]
    Invocation(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The host refused the request.
    #[error("{0}")]
    Failed(String),
    /// Failed to perform an I/O operation.
    #[error("filesystem operation failed: {0}")]
    Io(#[from] std::io::Error),
    /// Host state could not be decoded or encoded.
    #[error("invalid package state: {0}")]
    State(#[from] serde_json::Error),
}

impl HostError {
    /// Helper for host refusals.
    pub fn failed(msg: impl Into<String>) -> Self {
        HostError::Failed(msg.into())
    }

    /// Wrap an error the way a reflective dispatcher would.
    pub fn invocation(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        HostError::Invocation(Box::new(err))
    }
}
