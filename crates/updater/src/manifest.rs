use crate::error::ManifestFetchError;
use serde::{Deserialize, Serialize};

/// Registry document listing the latest release of every published package.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteManifest {
    /// Published packages, in registry order.
    #[serde(default)]
    pub packages: Vec<RemotePackage>,
}

impl RemoteManifest {
    /// Decode and validate a registry document.
    ///
    /// A document without a `packages` list, or with an empty one, is
    /// rejected: the registry never legitimately publishes nothing.
    pub fn from_slice(bytes: &[u8]) -> std::result::Result<Self, ManifestFetchError> {
        let manifest: RemoteManifest = serde_json::from_slice(bytes)?;
        if manifest.packages.is_empty() {
            return Err(ManifestFetchError::MissingPackages);
        }
        Ok(manifest)
    }

    /// Look up a package by identifier.
    pub fn package(&self, id: &str) -> Option<&RemotePackage> {
        self.packages.iter().find(|package| package.id == id)
    }
}

/// A single package entry as published by the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemotePackage {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Empty when the registry omits it; such entries are never installed.
    #[serde(default)]
    pub latest_version: String,
    /// URL of the installable archive for `latest_version`.
    #[serde(default)]
    pub latest_upm_targz: Option<String>,
}

impl RemotePackage {
    /// Archive URL, treating an empty string the same as a missing one.
    pub fn archive_url(&self) -> Option<&str> {
        self.latest_upm_targz
            .as_deref()
            .filter(|url| !url.trim().is_empty())
    }

    /// Human readable name, falling back to the identifier.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

/// A package as currently installed in the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPackage {
    pub id: String,
    pub version: String,
}

impl LocalPackage {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_registry_document() {
        let json = br#"{
            "packages": [
                {
                    "id": "com.example.core",
                    "displayName": "Core",
                    "latestUpmTargz": "https://cdn.example.com/core-2.0.0.tgz",
                    "latestVersion": "2.0.0"
                },
                { "id": "com.example.extras", "latestVersion": "0.3.1" }
            ]
        }"#;

        let manifest = RemoteManifest::from_slice(json).expect("valid manifest");
        assert_eq!(manifest.packages.len(), 2);

        let core = manifest.package("com.example.core").unwrap();
        assert_eq!(core.label(), "Core");
        assert_eq!(
            core.archive_url(),
            Some("https://cdn.example.com/core-2.0.0.tgz")
        );

        let extras = manifest.package("com.example.extras").unwrap();
        assert_eq!(extras.label(), "com.example.extras");
        assert_eq!(extras.archive_url(), None);
    }

    #[test]
    fn entry_without_version_does_not_reject_document() {
        let json = br#"{
            "packages": [
                { "id": "com.example.broken", "latestUpmTargz": "https://cdn/broken.tgz" },
                { "id": "com.example.core", "latestVersion": "2.0.0" }
            ]
        }"#;

        let manifest = RemoteManifest::from_slice(json).expect("document still decodes");
        assert_eq!(manifest.package("com.example.broken").unwrap().latest_version, "");
        assert_eq!(manifest.package("com.example.core").unwrap().latest_version, "2.0.0");
    }

    #[test]
    fn rejects_missing_or_empty_package_list() {
        assert!(matches!(
            RemoteManifest::from_slice(br#"{}"#),
            Err(ManifestFetchError::MissingPackages)
        ));
        assert!(matches!(
            RemoteManifest::from_slice(br#"{"packages": []}"#),
            Err(ManifestFetchError::MissingPackages)
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            RemoteManifest::from_slice(b"<html>502 Bad Gateway</html>"),
            Err(ManifestFetchError::Decode(_))
        ));
    }

    #[test]
    fn blank_archive_url_counts_as_missing() {
        let package = RemotePackage {
            id: "a".into(),
            display_name: None,
            latest_version: "1".into(),
            latest_upm_targz: Some("  ".into()),
        };
        assert_eq!(package.archive_url(), None);
    }
}
