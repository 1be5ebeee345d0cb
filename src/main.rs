use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use updater::{
    CycleOutcome, ErrorReport, LockfileHost, MarkerKind, Notifier, Trigger, Updater,
    UpdaterConfig, DEFAULT_REGISTRY_URL, DEFAULT_SELF_PACKAGE_ID, ERROR_TITLE,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Host working directory (project root)
    #[arg(short, long, env = "UPDATER_ROOT", default_value = ".")]
    root: PathBuf,

    /// Registry document URL
    #[arg(long, env = "UPDATER_REGISTRY_URL", default_value = DEFAULT_REGISTRY_URL)]
    registry_url: String,

    /// Identifier of the updater's own package
    #[arg(long, env = "UPDATER_SELF_PACKAGE", default_value = DEFAULT_SELF_PACKAGE_ID)]
    self_package: String,

    /// Lock file listing installed packages (default: <root>/Packages/packages-lock.json)
    #[arg(long, env = "UPDATER_LOCKFILE")]
    lockfile: Option<PathBuf>,

    /// Directory for downloaded archives (default: <root>/Temp)
    #[arg(long)]
    staging_dir: Option<PathBuf>,

    /// Directory for continuation markers (default: <root>/Temp)
    #[arg(long)]
    marker_dir: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Update every out-of-date package now
    Update,
    /// Run the automated check; refuses to replace the updater itself
    Check,
    /// Show what an update would do without changing anything
    Plan,
    /// Show which continuation markers are present
    Markers,
}

impl Cli {
    fn config(&self) -> UpdaterConfig {
        let mut config = UpdaterConfig::new(&self.root)
            .registry_url(self.registry_url.clone())
            .self_package_id(self.self_package.clone())
            .user_agent(concat!("updater/", env!("CARGO_PKG_VERSION")));
        if let Some(dir) = &self.staging_dir {
            config = config.staging_dir(dir);
        }
        if let Some(dir) = &self.marker_dir {
            config = config.marker_dir(dir);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.timeout(Duration::from_secs(secs));
        }
        config
    }
}

/// Prints cycle messages to the terminal.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notice(&self, title: &str, message: &str) {
        println!("{title}\n\n{message}");
    }

    fn error(&self, report: &ErrorReport) {
        eprintln!("{ERROR_TITLE}\n\n{}", report.dialog_text());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = cli.config();
    let lockfile = cli.lockfile.clone().unwrap_or_else(|| config.lockfile_path());
    let updater = Updater::from_config(&config, LockfileHost::new(lockfile))?
        .with_notifier(Arc::new(TerminalNotifier));

    let trigger = match cli.command {
        Commands::Update => Trigger::Manual,
        Commands::Check => Trigger::Automated,
        Commands::Plan => {
            let plan = updater.check().await?;
            if let Some(action) = plan.self_update() {
                println!(
                    "self-update {}: {} -> {} ({})",
                    action.id,
                    action.installed_version,
                    action.target_version,
                    action.archive_url
                );
                println!("other packages are deferred until the updater has been replaced");
            } else if plan.is_empty() {
                println!("all packages are up to date");
            } else {
                for action in plan.updates() {
                    println!(
                        "{} [{}]: {} -> {} ({})",
                        action.name,
                        action.id,
                        action.installed_version,
                        action.target_version,
                        action.archive_url
                    );
                }
            }
            return Ok(());
        }
        Commands::Markers => {
            for kind in [MarkerKind::SelfUpdated, MarkerKind::Updated] {
                let state = if updater.markers().is_present(kind) {
                    "present"
                } else {
                    "absent"
                };
                println!(
                    "{kind}: {state} ({})",
                    updater.markers().path(kind).display()
                );
            }
            return Ok(());
        }
    };

    let updater = Arc::new(updater);
    let Some(cycle) = updater.start_cycle(trigger) else {
        println!("an update is already running");
        return Ok(());
    };

    match summarize(&cycle.await?) {
        Some(line) => println!("{line}"),
        // The notifier already reported the failure.
        None => std::process::exit(1),
    }

    Ok(())
}

/// Terminal summary of a finished cycle, or `None` if it failed.
fn summarize(outcome: &CycleOutcome) -> Option<String> {
    let line = match outcome {
        CycleOutcome::Skipped => "an update is already running".to_string(),
        CycleOutcome::UpToDate => "all packages are up to date".to_string(),
        CycleOutcome::SelfUpdated { from, to } => format!(
            "updater replaced ({from} -> {to}); run the update again after the host reloads"
        ),
        CycleOutcome::Updated { packages } => {
            let names: Vec<&str> = packages.iter().map(|action| action.name.as_str()).collect();
            format!("handed to the host: {}", names.join(", "))
        }
        CycleOutcome::Failed(_) => return None,
    };
    Some(line)
}
