//! Pre-flight verification of the system components the router drives.
//!
//! Checks that the BlueZ daemon is running and that the PulseAudio tools
//! are installed. Problems are reported, never fixed, and never stop the
//! router from starting.

use crate::command::{CommandLine, CommandRunner};

/// Status of a system component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentStatus {
    /// Component is installed and running.
    Ok,
    /// Component is installed but not running.
    NotRunning,
    /// Component is not installed.
    NotInstalled,
}

/// A single setup issue with suggested fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupIssue {
    /// Description of the issue.
    pub description: String,
    /// Suggested command to fix the issue.
    pub fix_command: Option<String>,
}

/// Overall system setup status.
#[derive(Debug, Clone)]
pub struct SetupStatus {
    /// BlueZ daemon status.
    pub bluez: ComponentStatus,
    /// PulseAudio tool status (`pulseaudio`, `pactl`).
    pub audio_server: ComponentStatus,
    /// Whether `aplay` is available for hardware listing.
    pub alsa_utils: ComponentStatus,
    /// List of issues found.
    pub issues: Vec<SetupIssue>,
    /// Whether the system is ready for Bluetooth audio routing.
    pub ready: bool,
}

impl SetupStatus {
    /// Get a summary message for the status.
    pub fn summary(&self) -> String {
        if self.ready {
            "System is ready for Bluetooth audio routing".to_string()
        } else {
            format!("{} issue(s) found", self.issues.len())
        }
    }
}

/// System setup verification.
pub struct SystemSetup;

impl SystemSetup {
    /// Check system setup status using the given command runner.
    pub async fn check(runner: &dyn CommandRunner) -> SetupStatus {
        let mut issues = Vec::new();

        let bluez = Self::check_bluez(runner).await;
        match bluez {
            ComponentStatus::Ok => {}
            ComponentStatus::NotInstalled => issues.push(SetupIssue {
                description: "BlueZ is not installed".to_string(),
                fix_command: Some("sudo apt install bluez".to_string()),
            }),
            ComponentStatus::NotRunning => issues.push(SetupIssue {
                description: "Bluetooth service is not running".to_string(),
                fix_command: Some("sudo systemctl start bluetooth".to_string()),
            }),
        }

        let audio_server = if Self::is_installed(runner, "pulseaudio").await
            && Self::is_installed(runner, "pactl").await
        {
            ComponentStatus::Ok
        } else {
            issues.push(SetupIssue {
                description: "PulseAudio is not installed".to_string(),
                fix_command: Some(
                    "sudo apt install pulseaudio pulseaudio-module-bluetooth".to_string(),
                ),
            });
            ComponentStatus::NotInstalled
        };

        let alsa_utils = if Self::is_installed(runner, "aplay").await {
            ComponentStatus::Ok
        } else {
            issues.push(SetupIssue {
                description: "alsa-utils is not installed (hardware listing unavailable)"
                    .to_string(),
                fix_command: Some("sudo apt install alsa-utils".to_string()),
            });
            ComponentStatus::NotInstalled
        };

        // Hardware listing is informational, so alsa-utils does not gate readiness.
        let ready = bluez == ComponentStatus::Ok && audio_server == ComponentStatus::Ok;

        SetupStatus {
            bluez,
            audio_server,
            alsa_utils,
            issues,
            ready,
        }
    }

    async fn check_bluez(runner: &dyn CommandRunner) -> ComponentStatus {
        if !Self::is_installed(runner, "bluetoothctl").await {
            return ComponentStatus::NotInstalled;
        }

        let active = runner
            .run(&CommandLine::new("systemctl").args(["is-active", "--quiet", "bluetooth"]))
            .await;

        if active.is_success() {
            ComponentStatus::Ok
        } else {
            ComponentStatus::NotRunning
        }
    }

    async fn is_installed(runner: &dyn CommandRunner, program: &str) -> bool {
        runner
            .run(&CommandLine::new("which").arg(program))
            .await
            .is_success()
    }
}
