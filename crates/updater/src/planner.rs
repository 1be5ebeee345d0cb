//! Diffing of registry state against installed state.
//!
//! Versions are compared as opaque strings: any difference is an update.
//! The registry only ever moves versions forward, so no ordering is applied.

use crate::manifest::{LocalPackage, RemoteManifest};

/// A single package replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAction {
    pub id: String,
    /// Registry display name, or the identifier when none is published.
    pub name: String,
    pub installed_version: String,
    pub target_version: String,
    pub archive_url: String,
}

/// Actions decided for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    self_update: Option<UpdateAction>,
    updates: Vec<UpdateAction>,
}

impl UpdatePlan {
    /// Pending replacement of the updater package, if any.
    ///
    /// When present it is the only action of the cycle.
    pub fn self_update(&self) -> Option<&UpdateAction> {
        self.self_update.as_ref()
    }

    /// Ordinary replacements, in installed-package order.
    pub fn updates(&self) -> &[UpdateAction] {
        &self.updates
    }

    pub fn is_empty(&self) -> bool {
        self.self_update.is_none() && self.updates.is_empty()
    }

    /// Number of actions that will run this cycle.
    pub fn len(&self) -> usize {
        if self.self_update.is_some() {
            1
        } else {
            self.updates.len()
        }
    }
}

/// Build the plan for one cycle.
///
/// Packages are joined by identifier. Entries present on only one side are
/// ignored, and a remote entry without a version or an archive URL never
/// yields an action.
/// A pending update of `self_id` pre-empts every other action.
pub fn plan(remote: &RemoteManifest, local: &[LocalPackage], self_id: &str) -> UpdatePlan {
    let joined = local
        .iter()
        .filter_map(|installed| {
            remote
                .package(&installed.id)
                .map(|published| (installed, published))
        })
        .filter(|(_, published)| !published.latest_version.trim().is_empty())
        .filter(|(installed, published)| installed.version != published.latest_version)
        .filter_map(|(installed, published)| {
            published.archive_url().map(|url| UpdateAction {
                id: installed.id.clone(),
                name: published.label().to_string(),
                installed_version: installed.version.clone(),
                target_version: published.latest_version.clone(),
                archive_url: url.to_string(),
            })
        });

    let mut updates = Vec::new();
    for action in joined {
        if action.id == self_id {
            return UpdatePlan {
                self_update: Some(action),
                updates: Vec::new(),
            };
        }
        updates.push(action);
    }

    UpdatePlan {
        self_update: None,
        updates,
    }
}
