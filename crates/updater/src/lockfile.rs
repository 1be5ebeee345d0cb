//! File-backed package host.
//!
//! Installed state lives in a JSON lock file:
//!
//! ```json
//! { "dependencies": { "com.example.core": { "version": "1.0.0", "source": "registry" } } }
//! ```
//!
//! Adding a batch rewrites the whole file through a temporary sibling, so a
//! batch either lands completely or not at all.

use crate::error::HostError;
use crate::host::{InstallRequest, PackageHost};
use crate::manifest::LocalPackage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::task;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LockFile {
    #[serde(default)]
    pub dependencies: BTreeMap<String, LockEntry>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LockEntry {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Package host keeping installed state in a lock file.
#[derive(Debug, Clone)]
pub struct LockfileHost {
    path: PathBuf,
}

impl LockfileHost {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PackageHost for LockfileHost {
    async fn list_installed(&self) -> Result<Vec<LocalPackage>, HostError> {
        let path = self.path.clone();
        let lock = task::spawn_blocking(move || read_lock(&path))
            .await
            .map_err(HostError::invocation)??;

        Ok(lock
            .dependencies
            .into_iter()
            .map(|(id, entry)| LocalPackage::new(id, entry.version))
            .collect())
    }

    async fn add_packages(&self, batch: &[InstallRequest]) -> Result<(), HostError> {
        let path = self.path.clone();
        let batch = batch.to_vec();
        task::spawn_blocking(move || {
            let mut lock = read_lock(&path)?;
            for request in &batch {
                if !request.archive.is_file() {
                    return Err(HostError::failed(format!(
                        "archive for {} not found at {}",
                        request.id,
                        request.archive.display()
                    )));
                }
                let entry = lock
                    .dependencies
                    .entry(request.id.clone())
                    .or_insert_with(|| LockEntry {
                        version: String::new(),
                        source: None,
                        extra: serde_json::Map::new(),
                    });
                entry.version = request.version.clone();
                entry.source = Some(request.reference());
            }
            write_lock(&path, &lock)
        })
        .await
        .map_err(HostError::invocation)?
    }
}

fn read_lock(path: &Path) -> Result<LockFile, HostError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Replace the lock file atomically.
fn write_lock(path: &Path, lock: &LockFile) -> Result<(), HostError> {
    let parent = path
        .parent()
        .ok_or_else(|| HostError::failed("lock file path must have a parent directory"))?;

    let mut temp = NamedTempFile::new_in(parent)?;
    serde_json::to_writer_pretty(&mut temp, lock)?;
    temp.write_all(b"\n")?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| HostError::Io(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const LOCK: &str = r#"{
  "dependencies": {
    "com.example.core": { "version": "1.0.0", "source": "registry", "depth": 0 },
    "com.example.updater": { "version": "2.0.0" }
  },
  "schema": 3
}"#;

    fn host_with_lock(dir: &Path) -> LockfileHost {
        let path = dir.join("packages-lock.json");
        fs::write(&path, LOCK).unwrap();
        LockfileHost::new(path)
    }

    #[tokio::test]
    async fn lists_installed_packages() {
        let dir = tempdir().unwrap();
        let host = host_with_lock(dir.path());

        let installed = host.list_installed().await.unwrap();
        assert_eq!(
            installed,
            vec![
                LocalPackage::new("com.example.core", "1.0.0"),
                LocalPackage::new("com.example.updater", "2.0.0"),
            ]
        );
    }

    #[tokio::test]
    async fn batch_updates_versions_and_keeps_unknown_fields() {
        let dir = tempdir().unwrap();
        let host = host_with_lock(dir.path());
        let archive = dir.path().join("pkg-1.tgz");
        fs::write(&archive, b"tgz").unwrap();

        host.add_packages(&[InstallRequest {
            id: "com.example.core".into(),
            version: "2.0.0".into(),
            archive: archive.clone(),
        }])
        .await
        .unwrap();

        let lock: LockFile = serde_json::from_slice(&fs::read(host.path()).unwrap()).unwrap();
        let core = &lock.dependencies["com.example.core"];
        assert_eq!(core.version, "2.0.0");
        assert_eq!(
            core.source.as_deref(),
            Some(format!("file:{}", archive.display()).as_str())
        );
        assert_eq!(core.extra["depth"], serde_json::json!(0));
        assert_eq!(lock.extra["schema"], serde_json::json!(3));
        assert_eq!(lock.dependencies["com.example.updater"].version, "2.0.0");
    }

    #[tokio::test]
    async fn rejected_batch_leaves_lock_untouched() {
        let dir = tempdir().unwrap();
        let host = host_with_lock(dir.path());
        let present = dir.path().join("pkg-1.tgz");
        fs::write(&present, b"tgz").unwrap();

        let err = host
            .add_packages(&[
                InstallRequest {
                    id: "com.example.core".into(),
                    version: "2.0.0".into(),
                    archive: present,
                },
                InstallRequest {
                    id: "com.example.updater".into(),
                    version: "3.0.0".into(),
                    archive: dir.path().join("missing.tgz"),
                },
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, HostError::Failed(_)));
        assert_eq!(fs::read_to_string(host.path()).unwrap(), LOCK);
    }

    #[tokio::test]
    async fn missing_lock_file_is_an_error() {
        let dir = tempdir().unwrap();
        let host = LockfileHost::new(dir.path().join("nope.json"));
        assert!(matches!(
            host.list_installed().await,
            Err(HostError::Io(_))
        ));
    }
}
