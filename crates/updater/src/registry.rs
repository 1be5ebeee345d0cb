use crate::config::DEFAULT_REGISTRY_URL;
use crate::error::{ManifestFetchError, Result};
use crate::manifest::RemoteManifest;
use async_trait::async_trait;
use reqwest::{Client, Url};

/// Source of the remote package registry document.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Fetch and decode the registry document. Never retries.
    async fn fetch_manifest(&self) -> std::result::Result<RemoteManifest, ManifestFetchError>;
}

/// Builder for [`HttpRegistryClient`].
#[derive(Default)]
pub struct HttpRegistryClientBuilder {
    url: Option<Url>,
    client: Option<Client>,
}

impl HttpRegistryClientBuilder {
    /// Set the registry document URL.
    pub fn url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Provide a custom reqwest client instance.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<HttpRegistryClient> {
        let url = match self.url {
            Some(url) => url,
            None => Url::parse(DEFAULT_REGISTRY_URL)?,
        };
        let client = self.client.unwrap_or_else(Client::new);

        Ok(HttpRegistryClient { url, client })
    }
}

/// Registry client issuing one GET per fetch against a fixed URL.
#[derive(Clone)]
pub struct HttpRegistryClient {
    url: Url,
    client: Client,
}

impl HttpRegistryClient {
    /// Create a new builder.
    pub fn builder() -> HttpRegistryClientBuilder {
        HttpRegistryClientBuilder::default()
    }
}

#[async_trait]
impl RegistrySource for HttpRegistryClient {
    async fn fetch_manifest(&self) -> std::result::Result<RemoteManifest, ManifestFetchError> {
        tracing::debug!(url = %self.url, "fetching package registry");
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        RemoteManifest::from_slice(&bytes)
    }
}
