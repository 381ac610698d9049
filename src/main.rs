//! bt-audio-router - discoverable Bluetooth audio sink for single-board computers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use btrouter::{shutdown_signal, EffectiveUser, Service};
use btrouter_bluetooth::SystemBus;
use btrouter_core::{AudioTarget, RouterConfig, SystemCommandRunner};
use tracing::{error, info};

/// Command-line arguments
struct Args {
    /// Enable debug logging
    debug: bool,
    /// Log to this file instead of stderr
    log_file: Option<PathBuf>,
    /// Router configuration with command-line overrides applied
    config: RouterConfig,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            debug: false,
            log_file: None,
            config: RouterConfig::default(),
        }
    }
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--alias" | "-a" => match iter.next() {
                Some(alias) => args.config.alias = alias,
                None => missing_value(&arg),
            },
            "--sink" | "-s" => match iter.next() {
                Some(sink) => args.config.audio_target = AudioTarget::parse(&sink),
                None => missing_value(&arg),
            },
            "--no-discoverable" => {
                args.config.discoverable = false;
            }
            "--no-pairable" => {
                args.config.pairable = false;
            }
            "--debug" | "-d" => {
                args.debug = true;
            }
            "--log-file" | "-l" => match iter.next() {
                Some(path) => args.log_file = Some(PathBuf::from(path)),
                None => missing_value(&arg),
            },
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
    }

    args
}

fn missing_value(flag: &str) -> ! {
    eprintln!("Missing value for {}", flag);
    print_help();
    std::process::exit(1);
}

fn print_help() {
    println!("bt-audio-router - Bluetooth audio sink for single-board computers");
    println!();
    println!("Usage: sudo bt-audio-router [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -a, --alias NAME       Name shown to phones (default: raspberrypi)");
    println!("  -s, --sink DEVICE      Default output sink, or 'default' for the system sink");
    println!("      --no-discoverable  Do not make the adapter discoverable");
    println!("      --no-pairable      Do not accept pairing requests");
    println!("  -d, --debug            Enable debug logging");
    println!("  -l, --log-file PATH    Write logs to PATH instead of stderr");
    println!("  -h, --help             Show this help message");
}

fn setup_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    if let Some(path) = &args.log_file {
        match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                tracing_subscriber::fmt()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true)
                    .with_max_level(level)
                    .init();
                info!("Logging to {:?}", path);
                return Some(guard);
            }
            Err(e) => eprintln!("Cannot open log file {:?} ({}), logging to stderr", path, e),
        }
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level)
        .init();
    None
}

fn print_banner() {
    println!("{}", "=".repeat(60));
    println!("Bluetooth Audio Router");
    println!("{}", "=".repeat(60));
    println!();
}

fn print_instructions(alias: &str) {
    println!();
    println!("{}", "=".repeat(60));
    println!("Bluetooth Audio Router is RUNNING");
    println!("{}", "=".repeat(60));
    println!();
    println!("Instructions:");
    println!("1. On your phone, go to Bluetooth Settings");
    println!("2. Look for '{}'", alias);
    println!("3. Tap to connect");
    println!("4. Play audio on your phone - it will stream to the output device!");
    println!();
    println!("Press Ctrl+C to stop the service.");
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();

    // Setup logging before anything else
    let guard = setup_logging(&args);

    // Handlers go in before configuration so an early signal is held until
    // the service is parked.
    let shutdown = shutdown_signal()?;

    let config = args.config;
    config.validate()?;

    print_banner();

    let runner = Arc::new(SystemCommandRunner::new(config.audio.command_timeout));
    let service = Service::new(config, Arc::new(SystemBus), runner, Box::new(EffectiveUser))
        .with_preflight();

    if let Err(e) = service.start().await {
        error!("{}", e);
        // process::exit skips destructors; flush the file writer first.
        drop(guard);
        std::process::exit(e.exit_code());
    }

    print_instructions(&service.config().alias);

    service.wait_for_shutdown(shutdown).await;
    drop(guard);
    Ok(())
}
