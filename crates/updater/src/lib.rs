//! Registry-driven package updater with a guarded self-update handoff.
//!
//! One cycle fetches the registry document, lists what the host has
//! installed, plans the replacements, downloads the archives into a staging
//! area and hands them to the host as a single batch. If the updater's own
//! package is out of date, that replacement runs alone and everything else
//! waits for the next cycle, which runs on the new code after the host
//! reloads. A continuation marker left on disk tells the host's startup
//! logic which of the two happened.
//!
//! ```ignore
//! use std::sync::Arc;
//! use updater::{CycleOutcome, LockfileHost, Trigger, Updater, UpdaterConfig};
//!
//! # async fn demo() -> updater::Result<()> {
//! let config = UpdaterConfig::new("/path/to/project");
//! let host = LockfileHost::new(config.lockfile_path());
//! let updater = Arc::new(Updater::from_config(&config, host)?);
//!
//! if let Some(cycle) = updater.start_cycle(Trigger::Manual) {
//!     match cycle.await.expect("cycle task") {
//!         CycleOutcome::Failed(report) => eprintln!("{}", report.dialog_text()),
//!         outcome => println!("{outcome:?}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod applicator;
mod config;
mod error;
mod fetcher;
mod guard;
mod host;
mod lockfile;
mod manifest;
mod marker;
mod planner;
mod registry;
mod report;
mod updater;

pub use applicator::{BatchKind, InstallApplicator};
pub use config::{UpdaterConfig, DEFAULT_REGISTRY_URL, DEFAULT_SELF_PACKAGE_ID};
pub use error::{
    DownloadError, ErrorKind, HostError, InstallError, ManifestFetchError, Result, UpdaterError,
};
pub use fetcher::{ArchiveFetcher, HttpArchiveFetcher, HttpArchiveFetcherBuilder, StagedArchive};
pub use guard::{RunGuard, RunPermit, RunState};
pub use host::{InstallRequest, PackageHost};
pub use lockfile::{LockEntry, LockFile, LockfileHost};
pub use manifest::{LocalPackage, RemoteManifest, RemotePackage};
pub use marker::{ContinuationMarkers, MarkerKind};
pub use planner::{plan, UpdateAction, UpdatePlan};
pub use registry::{HttpRegistryClient, HttpRegistryClientBuilder, RegistrySource};
pub use report::{root_cause, ErrorReport, Notifier, TracingNotifier, ERROR_TITLE, NOTICE_TITLE};
pub use updater::{CycleOutcome, Trigger, Updater};
