//! # USB Voice Link - Host Entry Point
//!
//! Runs the endpoint over the process's standard streams: stdin carries the
//! host's bytes, stdout carries protocol lines, stderr carries logs.
//!
//! ## Runtime Layout:
//! - **reader task**: async stdin reads forwarded into an mpsc channel
//! - **signal task**: SIGINT / SIGTERM set the shutdown flag
//! - **control loop**: a blocking task that ticks the endpoint until shutdown
//!   or end of input
//!
//! ## Playback:
//! With `audio.playback_file` set, played audio is appended to that file as
//! raw 16-bit little-endian mono PCM. Without it the endpoint has no speaker
//! and flushes are logged and dropped.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use usb_voice_link::audio::sink::FileSink;
use usb_voice_link::clock::SystemClock;
use usb_voice_link::config::AppConfig;
use usb_voice_link::state::LinkMetrics;
use usb_voice_link::transport::{pump_reader, ChannelTransport};
use usb_voice_link::Endpoint;

/// Set by the signal task, read by the control loop.
static SHUTDOWN_SIGNAL: AtomicBool = AtomicBool::new(false);

/// Bytes the loop may consume back to back before yielding.
const TICK_BURST: usize = 4096;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting usb-voice-link v{}", env!("CARGO_PKG_VERSION"));

    let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(pump_reader(tokio::io::stdin(), sender));

    let transport = ChannelTransport::new(receiver, std::io::stdout());
    let mut endpoint = Endpoint::new(config.clone(), Arc::new(SystemClock::new()), Box::new(transport));

    match &config.audio.playback_file {
        Some(path) => {
            let sink = FileSink::open(path)?;
            info!("Playing audio into {}", sink.path().display());
            endpoint.set_speaker(Box::new(sink));
        }
        None => warn!("No playback file configured, audio will be dropped"),
    }

    setup_signal_handlers();

    let control_loop = tokio::task::spawn_blocking(move || run_loop(endpoint));
    let code = exit_code(control_loop.await);

    // the stdin reader may still be parked in a blocking read
    std::process::exit(code);
}

/// Process exit status for how the control loop ended: 0 for a clean stop,
/// 1 if the loop task failed.
fn exit_code<E: std::fmt::Display>(outcome: std::result::Result<LinkMetrics, E>) -> i32 {
    match outcome {
        Ok(metrics) => {
            info!("Link stopped: {:?}", metrics);
            0
        }
        Err(e) => {
            error!("Control loop task error: {}", e);
            1
        }
    }
}

/// Tick the endpoint until shutdown is requested or the host input ends.
fn run_loop(mut endpoint: Endpoint) -> LinkMetrics {
    endpoint.start();

    while !SHUTDOWN_SIGNAL.load(Ordering::SeqCst) {
        let mut consumed = 0;
        while consumed < TICK_BURST && endpoint.tick() {
            consumed += 1;
        }

        if consumed == 0 {
            if endpoint.transport_closed() {
                info!("Host input ended, stopping");
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    endpoint.metrics().clone()
}

/// Logs go to stderr; stdout belongs to the protocol.
///
/// ## Environment Variables:
/// - `RUST_LOG`: filter directives, defaulting to `usb_voice_link=info`
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "usb_voice_link=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

fn setup_signal_handlers() {
    tokio::spawn(async {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                (Err(e), _) | (_, Err(e)) => {
                    error!("Failed to install signal handlers: {}", e);
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }

        SHUTDOWN_SIGNAL.store(true, Ordering::SeqCst);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_reflects_loop_outcome() {
        assert_eq!(exit_code::<String>(Ok(LinkMetrics::default())), 0);
        assert_eq!(exit_code(Err("control loop panicked".to_string())), 1);
    }
}
