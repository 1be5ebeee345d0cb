use crate::{
    applicator::{BatchKind, InstallApplicator},
    config::{UpdaterConfig, DEFAULT_SELF_PACKAGE_ID},
    error::{Result, UpdaterError},
    fetcher::{ArchiveFetcher, HttpArchiveFetcher},
    guard::{RunGuard, RunPermit},
    host::{InstallRequest, PackageHost},
    marker::ContinuationMarkers,
    planner::{self, UpdateAction, UpdatePlan},
    registry::{HttpRegistryClient, RegistrySource},
    report::{ErrorReport, Notifier, TracingNotifier},
};
use futures::future::try_join_all;
use reqwest::Url;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// What started a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The user asked for an update.
    Manual,
    /// Background check; must never self-update silently.
    Automated,
}

impl Trigger {
    pub fn is_automated(self) -> bool {
        matches!(self, Trigger::Automated)
    }
}

/// Result of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle was already running; nothing was done.
    Skipped,
    /// Every installed package matches the registry.
    UpToDate,
    /// The updater package was replaced; other packages wait for the next cycle.
    SelfUpdated { from: String, to: String },
    /// Ordinary packages were handed to the host.
    Updated { packages: Vec<UpdateAction> },
    /// The cycle failed; the report was delivered to the notifier.
    Failed(ErrorReport),
}

/// Update orchestrator: fetches the registry, diffs it against the host and
/// installs what changed.
pub struct Updater<R, H, F> {
    registry: R,
    host: Arc<H>,
    fetcher: F,
    applicator: InstallApplicator<H>,
    notifier: Arc<dyn Notifier>,
    self_package_id: String,
    guard: RunGuard,
}

impl<H> Updater<HttpRegistryClient, H, HttpArchiveFetcher>
where
    H: PackageHost,
{
    /// Build an updater talking HTTP, configured from `config`.
    pub fn from_config(config: &UpdaterConfig, host: H) -> Result<Self> {
        let client = config
            .http_client()
            .map_err(|err| UpdaterError::Other(format!("failed to build HTTP client: {err}")))?;
        let registry = HttpRegistryClient::builder()
            .url(Url::parse(&config.registry_url)?)
            .client(client.clone())
            .build()?;
        let fetcher = HttpArchiveFetcher::builder()
            .staging_dir(config.staging_path())
            .client(client)
            .build();

        Ok(Updater::new(
            registry,
            Arc::new(host),
            fetcher,
            ContinuationMarkers::from_config(config),
        )
        .with_self_package_id(config.self_package_id.clone()))
    }
}

impl<R, H, F> Updater<R, H, F>
where
    R: RegistrySource,
    H: PackageHost,
    F: ArchiveFetcher,
{
    /// Create a new updater from its collaborators.
    pub fn new(registry: R, host: Arc<H>, fetcher: F, markers: ContinuationMarkers) -> Self {
        let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
        Self {
            registry,
            applicator: InstallApplicator::new(Arc::clone(&host), markers, Arc::clone(&notifier)),
            host,
            fetcher,
            notifier,
            self_package_id: DEFAULT_SELF_PACKAGE_ID.to_string(),
            guard: RunGuard::new(),
        }
    }

    /// Route user-visible messages to `notifier`.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        let markers = self.applicator.markers().clone();
        self.applicator =
            InstallApplicator::new(Arc::clone(&self.host), markers, Arc::clone(&notifier));
        self.notifier = notifier;
        self
    }

    /// Treat `id` as the updater's own package.
    pub fn with_self_package_id(mut self, id: impl Into<String>) -> Self {
        self.self_package_id = id.into();
        self
    }

    pub fn guard(&self) -> &RunGuard {
        &self.guard
    }

    pub fn markers(&self) -> &ContinuationMarkers {
        self.applicator.markers()
    }

    /// Fetch the registry and installed state and plan the cycle, without
    /// changing anything.
    pub async fn check(&self) -> Result<UpdatePlan> {
        let manifest = self.registry.fetch_manifest().await?;
        let installed = self
            .host
            .list_installed()
            .await
            .map_err(UpdaterError::Inventory)?;
        Ok(planner::plan(&manifest, &installed, &self.self_package_id))
    }

    /// Run one cycle on the current task.
    ///
    /// Returns [`CycleOutcome::Skipped`] if a cycle is already running.
    /// Failures never escape: they are reported once and returned as
    /// [`CycleOutcome::Failed`].
    pub async fn run_cycle(&self, trigger: Trigger) -> CycleOutcome {
        match self.guard.try_start() {
            Some(permit) => self.run_guarded(permit, trigger).await,
            None => {
                tracing::debug!(?trigger, "update cycle already running; request dropped");
                CycleOutcome::Skipped
            }
        }
    }

    /// Start a cycle on a background task.
    ///
    /// The guard is taken before spawning, so a call made while a cycle is in
    /// flight returns `None` immediately.
    pub fn start_cycle(self: &Arc<Self>, trigger: Trigger) -> Option<JoinHandle<CycleOutcome>>
    where
        R: 'static,
        H: 'static,
        F: 'static,
    {
        let Some(permit) = self.guard.try_start() else {
            tracing::debug!(?trigger, "update cycle already running; request dropped");
            return None;
        };
        let this = Arc::clone(self);
        Some(tokio::spawn(async move {
            this.run_guarded(permit, trigger).await
        }))
    }

    async fn run_guarded(&self, _permit: RunPermit, trigger: Trigger) -> CycleOutcome {
        match self.run_unguarded(trigger).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let report = ErrorReport::from_error(&err);
                tracing::error!(error = %err, "update cycle failed");
                self.notifier.error(&report);
                CycleOutcome::Failed(report)
            }
        }
    }

    async fn run_unguarded(&self, trigger: Trigger) -> Result<CycleOutcome> {
        let plan = self.check().await?;

        if let Some(action) = plan.self_update() {
            tracing::info!(
                "Upgrading updater from {} to {}",
                action.installed_version,
                action.target_version
            );
            if trigger.is_automated() {
                return Err(UpdaterError::AutomatedSelfUpdate {
                    installed: action.installed_version.clone(),
                    available: action.target_version.clone(),
                });
            }

            let staged = self.fetcher.fetch(&action.archive_url).await?;
            let request = InstallRequest {
                id: action.id.clone(),
                version: action.target_version.clone(),
                archive: staged.into_path(),
            };
            self.applicator
                .apply(BatchKind::SelfUpdate, std::slice::from_ref(&request))
                .await?;

            return Ok(CycleOutcome::SelfUpdated {
                from: action.installed_version.clone(),
                to: action.target_version.clone(),
            });
        }

        if plan.is_empty() {
            tracing::info!("all packages are up to date");
            return Ok(CycleOutcome::UpToDate);
        }

        for action in plan.updates() {
            tracing::info!(
                "Upgrading {} from {} to {}",
                action.name,
                action.installed_version,
                action.target_version
            );
        }

        let staged = try_join_all(
            plan.updates()
                .iter()
                .map(|action| self.fetcher.fetch(&action.archive_url)),
        )
        .await?;

        let batch: Vec<InstallRequest> = plan
            .updates()
            .iter()
            .zip(staged)
            .map(|(action, archive)| InstallRequest {
                id: action.id.clone(),
                version: action.target_version.clone(),
                archive: archive.into_path(),
            })
            .collect();
        self.applicator.apply(BatchKind::Ordinary, &batch).await?;

        Ok(CycleOutcome::Updated {
            packages: plan.updates().to_vec(),
        })
    }
}
