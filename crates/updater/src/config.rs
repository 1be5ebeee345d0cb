//! Configuration for the update orchestrator.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Registry document consulted on every cycle.
pub const DEFAULT_REGISTRY_URL: &str = "https://updates.vrcfury.com/updates.json";

/// Identifier of the package that ships this updater.
pub const DEFAULT_SELF_PACKAGE_ID: &str = "com.vrcfury.updater";

const SELF_UPDATED_MARKER: &str = "vrcfUpdateAll";
const UPDATED_MARKER: &str = "vrcfUpdated";

/// Configuration for the update orchestrator.
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// Registry document URL
    pub registry_url: String,
    /// Identifier of the updater's own package
    pub self_package_id: String,
    /// Host working directory (project root)
    pub root: PathBuf,
    /// Where downloaded archives are staged; defaults to `<root>/Temp`
    pub staging_dir: Option<PathBuf>,
    /// Where continuation markers are written; defaults to `<root>/Temp`
    pub marker_dir: Option<PathBuf>,
    /// Per-request timeout; `None` keeps the HTTP client's default
    pub timeout: Option<Duration>,
    /// User agent sent with registry and archive requests
    pub user_agent: Option<String>,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            self_package_id: DEFAULT_SELF_PACKAGE_ID.to_string(),
            root: PathBuf::from("."),
            staging_dir: None,
            marker_dir: None,
            timeout: None,
            user_agent: None,
        }
    }
}

impl UpdaterConfig {
    /// Create a new config rooted at the given host working directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Set the registry URL
    pub fn registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = url.into();
        self
    }

    /// Set the identifier treated as the updater's own package
    pub fn self_package_id(mut self, id: impl Into<String>) -> Self {
        self.self_package_id = id.into();
        self
    }

    /// Set the staging directory
    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Set the marker directory
    pub fn marker_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.marker_dir = Some(dir.into());
        self
    }

    /// Set a request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn staging_path(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(|| self.root.join("Temp"))
    }

    fn marker_base(&self) -> PathBuf {
        self.marker_dir
            .clone()
            .unwrap_or_else(|| self.root.join("Temp"))
    }

    /// Marker signalling that the updater package itself was just replaced.
    pub fn self_updated_marker(&self) -> PathBuf {
        self.marker_base().join(SELF_UPDATED_MARKER)
    }

    /// Marker signalling that other packages were just replaced.
    pub fn updated_marker(&self) -> PathBuf {
        self.marker_base().join(UPDATED_MARKER)
    }

    /// Location of the file-backed host's lock file.
    pub fn lockfile_path(&self) -> PathBuf {
        lockfile_in(&self.root)
    }

    /// Build a reqwest client honouring the timeout and user agent.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder.build()
    }
}

fn lockfile_in(root: &Path) -> PathBuf {
    root.join("Packages").join("packages-lock.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_follow_root() {
        let config = UpdaterConfig::new("/work/project");
        assert_eq!(config.staging_path(), PathBuf::from("/work/project/Temp"));
        assert_eq!(
            config.self_updated_marker(),
            PathBuf::from("/work/project/Temp/vrcfUpdateAll")
        );
        assert_eq!(
            config.updated_marker(),
            PathBuf::from("/work/project/Temp/vrcfUpdated")
        );
        assert_eq!(
            config.lockfile_path(),
            PathBuf::from("/work/project/Packages/packages-lock.json")
        );
    }

    #[test]
    fn overrides_take_precedence() {
        let config = UpdaterConfig::new("/p")
            .staging_dir("/tmp/stage")
            .marker_dir("/tmp/markers")
            .self_package_id("com.example.updater");
        assert_eq!(config.staging_path(), PathBuf::from("/tmp/stage"));
        assert_eq!(
            config.updated_marker(),
            PathBuf::from("/tmp/markers/vrcfUpdated")
        );
        assert_eq!(config.self_package_id, "com.example.updater");
        assert_eq!(config.registry_url, DEFAULT_REGISTRY_URL);
    }
}
