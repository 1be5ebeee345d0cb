use crate::error::{ErrorKind, UpdaterError};
use std::error::Error as StdError;

/// Title used for every error dialog.
pub const ERROR_TITLE: &str = "Updater Error";
/// Title used for the recompilation notice.
pub const NOTICE_TITLE: &str = "Updater";

const RECOMPILE_NOTICE: &str = "The host is now recompiling the updated packages.\n\n\
You should receive another message when the upgrade is complete.";

/// Receives the user-visible outcome of a cycle.
///
/// A failed cycle produces exactly one [`Notifier::error`] call; an applied
/// ordinary batch produces one [`Notifier::notice`] call.
pub trait Notifier: Send + Sync {
    fn notice(&self, title: &str, message: &str);
    fn error(&self, report: &ErrorReport);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notice(&self, title: &str, message: &str) {
        tracing::info!(%title, "{message}");
    }

    fn error(&self, report: &ErrorReport) {
        tracing::error!(title = ERROR_TITLE, kind = ?report.kind, "{}", report.dialog_text());
    }
}

/// Summary of a failed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    /// Description of the deepest cause.
    pub message: String,
    /// Every error in the chain, outermost first.
    pub chain: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(err: &UpdaterError) -> Self {
        let chain: Vec<String> = causes(err).map(|cause| cause.to_string()).collect();
        Self {
            kind: err.kind(),
            message: root_cause(err).to_string(),
            chain,
        }
    }

    /// Body of the error dialog.
    pub fn dialog_text(&self) -> String {
        format!("The updater encountered an error.\n\n{}", self.message)
    }
}

/// Notice shown after an ordinary batch was handed to the host.
pub fn recompile_notice() -> &'static str {
    RECOMPILE_NOTICE
}

fn causes<'a>(
    err: &'a (dyn StdError + 'static),
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(err), |&current| current.source())
}

/// Follow `source()` links until an error with no further cause.
///
/// Dispatch wrappers carry their real failure as a source, so they are
/// peeled off without inspecting concrete types.
pub fn root_cause<'a>(err: &'a (dyn StdError + 'static)) -> &'a (dyn StdError + 'static) {
    causes(err).last().unwrap_or(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HostError, InstallError, ManifestFetchError};

    #[test]
    fn peels_nested_invocation_wrappers() {
        let inner = HostError::failed("package com.example.core is locked");
        let wrapped = HostError::invocation(HostError::invocation(inner));
        let err = UpdaterError::Install(InstallError::Rejected(wrapped));

        let report = ErrorReport::from_error(&err);
        assert_eq!(report.kind, ErrorKind::Install);
        assert_eq!(report.message, "package com.example.core is locked");
        assert_eq!(report.chain.len(), 5);
        assert!(report.chain[0].starts_with("failed to install packages"));
        assert!(report
            .dialog_text()
            .ends_with("\n\npackage com.example.core is locked"));
    }

    #[test]
    fn error_without_cause_is_its_own_root() {
        let err = UpdaterError::ManifestFetch(ManifestFetchError::MissingPackages);
        assert_eq!(
            root_cause(&err).to_string(),
            "registry document contains no packages"
        );

        let err = UpdaterError::AutomatedSelfUpdate {
            installed: "2.0".into(),
            available: "3.0".into(),
        };
        let report = ErrorReport::from_error(&err);
        assert_eq!(report.kind, ErrorKind::AutomatedSelfUpdate);
        assert_eq!(report.chain.len(), 1);
        assert!(report.message.contains("2.0 -> 3.0"));
    }
}
