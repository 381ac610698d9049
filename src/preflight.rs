//! Pre-flight report of the system components the router drives.

use btrouter_core::{CommandRunner, SetupStatus, SystemSetup};
use tracing::{info, warn};

/// Check the system and log every issue as a warning. Never fatal.
pub async fn report_system_setup(runner: &dyn CommandRunner) -> SetupStatus {
    let status = SystemSetup::check(runner).await;

    if status.ready && status.issues.is_empty() {
        info!("{}", status.summary());
        return status;
    }

    warn!("System setup: {}", status.summary());
    for issue in &status.issues {
        match &issue.fix_command {
            Some(fix) => warn!("  - {} (fix: {})", issue.description, fix),
            None => warn!("  - {}", issue.description),
        }
    }
    status
}
