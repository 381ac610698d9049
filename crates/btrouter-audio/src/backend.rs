//! Audio server configuration sequence.

use std::fmt;
use std::sync::Arc;

use btrouter_core::{AudioTarget, CommandLine, CommandOutcome, CommandRunner, RestartTiming};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Bridging modules, in load order.
pub const BRIDGE_MODULES: [&str; 3] = [
    "module-bluetooth-discover",
    "module-bluetooth-policy",
    "module-switch-on-connect",
];

/// One step of the audio configuration sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioStep {
    /// `pulseaudio -k`
    StopServer,
    /// `pulseaudio --start`
    StartServer,
    /// `pactl load-module <module>`
    LoadModule(&'static str),
    /// `pactl set-default-sink <device>`
    SetDefaultSink(String),
    /// `aplay -l`
    ListHardware,
}

impl AudioStep {
    /// The command line that performs this step.
    pub fn command(&self) -> CommandLine {
        match self {
            AudioStep::StopServer => CommandLine::new("pulseaudio").arg("-k"),
            AudioStep::StartServer => CommandLine::new("pulseaudio").arg("--start"),
            AudioStep::LoadModule(module) => {
                CommandLine::new("pactl").args(["load-module", *module])
            }
            AudioStep::SetDefaultSink(device) => {
                CommandLine::new("pactl").args(["set-default-sink", device.as_str()])
            }
            AudioStep::ListHardware => CommandLine::new("aplay").arg("-l"),
        }
    }
}

impl fmt::Display for AudioStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioStep::StopServer => write!(f, "stop audio server"),
            AudioStep::StartServer => write!(f, "start audio server"),
            AudioStep::LoadModule(module) => write!(f, "load {}", module),
            AudioStep::SetDefaultSink(device) => write!(f, "set default sink '{}'", device),
            AudioStep::ListHardware => write!(f, "list hardware"),
        }
    }
}

/// Outcome of a single step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: AudioStep,
    pub outcome: CommandOutcome,
}

/// What happened during `AudioBackendConfigurator::configure`.
///
/// Informational only; the service never gates on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioReport {
    /// Every issued step, in order.
    pub steps: Vec<StepReport>,
    /// `aplay -l` lines naming a physical card.
    pub cards: Vec<String>,
}

impl AudioReport {
    /// Steps that did not succeed.
    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| !s.outcome.is_success())
    }

    /// Whether every issued step succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.failures().next().is_none()
    }

    fn record(&mut self, step: AudioStep, outcome: CommandOutcome) -> &CommandOutcome {
        self.steps.push(StepReport { step, outcome });
        &self.steps[self.steps.len() - 1].outcome
    }
}

/// Drives PulseAudio into a state where Bluetooth sources play to the
/// configured sink.
pub struct AudioBackendConfigurator {
    runner: Arc<dyn CommandRunner>,
    target: AudioTarget,
    timing: RestartTiming,
}

impl AudioBackendConfigurator {
    pub fn new(runner: Arc<dyn CommandRunner>, target: AudioTarget, timing: RestartTiming) -> Self {
        Self {
            runner,
            target,
            timing,
        }
    }

    /// Run the whole sequence: restart, modules, default sink, hardware list.
    ///
    /// Never fails; each step's outcome is logged and kept in the report.
    pub async fn configure(&self) -> AudioReport {
        info!("Setting up audio routing...");
        let mut report = AudioReport::default();

        self.restart_server(&mut report).await;
        self.load_bridge_modules(&mut report).await;
        self.select_default_sink(&mut report).await;
        self.list_hardware(&mut report).await;

        report
    }

    /// Kill and restart the server so module loading starts from a clean slate.
    async fn restart_server(&self, report: &mut AudioReport) {
        info!("Restarting PulseAudio to apply changes...");

        let outcome = self.step(report, AudioStep::StopServer).await;
        if !outcome.is_success() {
            // Not running is the common case here.
            debug!("Audio server stop: {}", outcome);
        }
        sleep(self.timing.after_kill).await;

        let outcome = self.step(report, AudioStep::StartServer).await;
        if !outcome.is_success() {
            warn!("Failed to start PulseAudio: {}", outcome);
        }
        sleep(self.timing.after_start).await;
    }

    async fn load_bridge_modules(&self, report: &mut AudioReport) {
        info!("Loading Bluetooth audio modules...");
        for module in BRIDGE_MODULES {
            let outcome = self.step(report, AudioStep::LoadModule(module)).await;
            if outcome.is_success() {
                debug!("Loaded {}", module);
            } else {
                warn!("Failed to load {}: {}", module, outcome);
            }
        }
    }

    async fn select_default_sink(&self, report: &mut AudioReport) {
        let device = match &self.target {
            AudioTarget::SystemDefault => {
                info!("Using default audio sink.");
                return;
            }
            AudioTarget::Device(device) => device.clone(),
        };

        let outcome = self
            .step(report, AudioStep::SetDefaultSink(device.clone()))
            .await;
        if outcome.is_success() {
            info!(
                "Audio routing configured successfully. Default sink set to: '{}'",
                device
            );
        } else {
            warn!(
                "Failed to set default audio sink to '{}'. Check if the device exists.",
                device
            );
        }
    }

    async fn list_hardware(&self, report: &mut AudioReport) {
        let outcome = self.step(report, AudioStep::ListHardware).await;
        let Some(stdout) = outcome.stdout() else {
            return;
        };

        let cards: Vec<String> = stdout
            .lines()
            .filter(|line| line.starts_with("card"))
            .map(str::to_string)
            .collect();

        info!("Available audio devices:");
        for card in &cards {
            info!("   {}", card);
        }
        report.cards = cards;
    }

    async fn step<'r>(&self, report: &'r mut AudioReport, step: AudioStep) -> &'r CommandOutcome {
        let outcome = self.runner.run(&step.command()).await;
        report.record(step, outcome)
    }
}
