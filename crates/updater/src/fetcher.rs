use crate::error::DownloadError;
use async_trait::async_trait;
use reqwest::Client;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tokio::task;

/// A downloaded archive waiting in the staging area.
///
/// The file is left on disk after installation; the host owns cleanup of
/// its staging area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArchive {
    path: PathBuf,
}

impl StagedArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Abstraction over downloading package archives.
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// Download `url` into a freshly allocated staging file.
    async fn fetch(&self, url: &str) -> Result<StagedArchive, DownloadError>;
}

/// Builder for [`HttpArchiveFetcher`].
#[derive(Default)]
pub struct HttpArchiveFetcherBuilder {
    staging_dir: Option<PathBuf>,
    client: Option<Client>,
}

impl HttpArchiveFetcherBuilder {
    /// Set the directory archives are staged in.
    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Provide a custom reqwest client instance.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the fetcher.
    pub fn build(self) -> HttpArchiveFetcher {
        let staging_dir = self.staging_dir.unwrap_or_else(std::env::temp_dir);
        let client = self.client.unwrap_or_else(Client::new);

        HttpArchiveFetcher {
            staging_dir,
            client,
        }
    }
}

/// Archive fetcher downloading over HTTP into uniquely named staging files.
#[derive(Clone)]
pub struct HttpArchiveFetcher {
    staging_dir: PathBuf,
    client: Client,
}

impl HttpArchiveFetcher {
    /// Create a new builder.
    pub fn builder() -> HttpArchiveFetcherBuilder {
        HttpArchiveFetcherBuilder::default()
    }
}

#[async_trait]
impl ArchiveFetcher for HttpArchiveFetcher {
    async fn fetch(&self, url: &str) -> Result<StagedArchive, DownloadError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        let staging_dir = self.staging_dir.clone();
        // Perform blocking filesystem work in a dedicated thread.
        let path = task::spawn_blocking(move || stage_bytes(&bytes, &staging_dir))
            .await
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))??;

        tracing::debug!(%url, path = %path.display(), "staged package archive");
        Ok(StagedArchive::new(path))
    }
}

/// Write `bytes` to a new, never-reused file in `staging_dir`.
fn stage_bytes(bytes: &[u8], staging_dir: &Path) -> std::io::Result<PathBuf> {
    if !staging_dir.exists() {
        fs::create_dir_all(staging_dir)?;
    }

    let mut temp = Builder::new()
        .prefix("pkg-")
        .suffix(".tgz")
        .tempfile_in(staging_dir)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.as_file().sync_all()?;

    let (_, path) = temp.keep().map_err(|err| err.error)?;
    Ok(path)
}
