//! Camera Gate CLI
//!
//! Replays a scripted camera session through the component host using
//! mock driver and permission collaborators.

use camera_gate::{
    driver::Platform,
    host::RenderMode,
    metrics::MetricsRegistry,
    session::{run_session, SessionFile},
};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "camera-gate", version, about = "Replay a scripted camera session")]
struct Cli {
    /// Session file (TOML). Runs the built-in demo session when omitted.
    session: Option<PathBuf>,

    /// Override the simulated platform (android, ios).
    #[arg(long)]
    platform: Option<Platform>,

    /// Override the render mode (gated, caller-controlled).
    #[arg(long)]
    mode: Option<RenderMode>,

    /// Print the final metrics in Prometheus text format.
    #[arg(long)]
    print_metrics: bool,
}

#[cfg(feature = "metrics")]
fn spawn_metrics_server(port: u16, metrics: &MetricsRegistry) {
    use camera_gate::metrics::{MetricsServer, MetricsServerConfig};

    if port == 0 {
        return;
    }
    let server = MetricsServer::new(MetricsServerConfig::with_port(port), metrics.clone());
    tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Metrics server stopped: {}", e);
        }
    });
}

#[cfg(not(feature = "metrics"))]
fn spawn_metrics_server(port: u16, _metrics: &MetricsRegistry) {
    if port != 0 {
        info!(port, "Built without the metrics feature, not serving metrics");
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Camera Gate v{}", camera_gate::VERSION);

    let cli = Cli::parse();

    let mut session = match &cli.session {
        Some(path) => match SessionFile::from_file(path) {
            Ok(session) => session,
            Err(e) => {
                eprintln!("Failed to load session {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            info!("No session file given, running demo session");
            SessionFile::demo()
        }
    };
    if let Some(platform) = cli.platform {
        session.driver.platform = platform;
    }
    if let Some(mode) = cli.mode {
        session.mode = mode;
    }

    let metrics = match MetricsRegistry::new() {
        Ok(metrics) => metrics,
        Err(e) => {
            eprintln!("Failed to create metrics registry: {}", e);
            std::process::exit(1);
        }
    };

    spawn_metrics_server(session.metrics.port, &metrics);

    info!(
        platform = %session.driver.platform,
        mode = ?session.mode,
        events = session.events.len(),
        "Running session"
    );

    let report = match run_session(&session, metrics.clone()).await {
        Ok(report) => report,
        Err(e) => {
            error!("Session failed: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Status {}: {} events forwarded, {} suppressed",
        report.status, report.events_forwarded, report.events_suppressed
    );

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("Failed to encode report: {}", e),
    }

    if cli.print_metrics {
        match metrics.encode() {
            Ok(text) => print!("{text}"),
            Err(e) => error!("Failed to encode metrics: {}", e),
        }
    }
}
