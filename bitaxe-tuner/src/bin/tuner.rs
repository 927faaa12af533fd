//! Command-line entry point for the Bitaxe tuner.
//!
//! Sweeps one device through increasing frequencies (and voltages when
//! hashrate falls short), then leaves it on the best setting found.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use bitaxe_tuner::api_client::HttpDeviceClient;
use bitaxe_tuner::config::TunerConfig;
use bitaxe_tuner::recovery::FinalizeOutcome;
use bitaxe_tuner::results::JsonFileStore;
use bitaxe_tuner::session::{RunReport, Tuner};
use bitaxe_tuner::tracing::{init_stderr, prelude::*};
use bitaxe_tuner::types::{BenchmarkEntry, SweepPoint};

const DISCLAIMER: &str = "\
DISCLAIMER: This tool stress-tests the device by running it at increasing
frequencies and voltages. Overclocking can damage hardware and voids
warranties. Monitor the device while the tuner runs. Use at your own risk.";

/// Voltage/frequency tuner for Bitaxe miners
#[derive(Parser, Debug)]
#[command(name = "bitaxe-tuner", version)]
struct Args {
    /// IP address or host name of the device
    address: Option<String>,

    /// Starting core voltage in mV
    #[arg(short = 'v', long = "voltage", default_value_t = 1150)]
    voltage_mv: u32,

    /// Starting frequency in MHz
    #[arg(short = 'f', long = "frequency", default_value_t = 500)]
    frequency_mhz: u32,

    /// TOML file overriding the built-in limits
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the results file
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let Some(address) = args.address.clone() else {
        // Help output is best effort; the exit status carries the error
        let _ = Args::command().print_help();
        return ExitCode::FAILURE;
    };

    init_stderr();

    match run(address, args).await {
        Ok(report) if report.is_clean() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = format!("{e:#}"), "Tuner failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(address: String, args: Args) -> Result<RunReport> {
    let config = match &args.config {
        Some(path) => TunerConfig::load(path)?,
        None => TunerConfig::default(),
    };
    let initial = SweepPoint::new(args.voltage_mv, args.frequency_mhz);

    println!("{DISCLAIMER}\n");

    let device = HttpDeviceClient::new(&address, &config.device)
        .context("failed to build HTTP client")?;
    let store = JsonFileStore::for_device(&args.output_dir, &address);
    info!(
        device = device.base_url(),
        start = %initial,
        results = %store.path().display(),
        "Starting tuner"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(listen_for_shutdown(shutdown.clone()));

    let tuner = Tuner::connect(
        Arc::new(device),
        config,
        initial,
        Box::new(store),
        shutdown,
    )
    .await?;
    let report = tuner.execute().await;
    print_summary(&report);
    Ok(report)
}

/// Cancel `shutdown` on the first Ctrl-C or SIGTERM.
///
/// Later signals are swallowed so restoring the device is never cut short.
async fn listen_for_shutdown(shutdown: CancellationToken) {
    #[cfg(unix)]
    let mut terminate = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(stream) => Some(stream),
        Err(e) => {
            warn!(error = %e, "Failed to install SIGTERM handler");
            None
        }
    };

    loop {
        #[cfg(unix)]
        let terminated = async {
            match terminate.as_mut() {
                Some(stream) => {
                    stream.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };
        #[cfg(not(unix))]
        let terminated = std::future::pending::<()>();

        tokio::select! {
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    error!(error = %e, "Failed to listen for Ctrl-C");
                    return;
                }
            }
            _ = terminated => {}
        }

        if shutdown.is_cancelled() {
            warn!("Already shutting down, waiting for device restore to finish");
        } else {
            info!("Interrupted, stopping benchmark and restoring device settings");
            shutdown.cancel();
        }
    }
}

fn print_summary(report: &RunReport) {
    println!();
    println!("Benchmark ended: {}", report.stop);
    match &report.restore {
        FinalizeOutcome::Restored { point, source } => {
            println!("Device restored to {source}: {point}");
        }
        FinalizeOutcome::RestoreFailed {
            point,
            source,
            error,
        } => {
            println!("FAILED to restore {source} ({point}): {error}");
            println!("Check the device and set its voltage and frequency manually.");
        }
        FinalizeOutcome::AlreadyFinalized => {}
    }

    if report.results.is_empty() {
        println!("No valid benchmark results.");
        return;
    }

    print_ranking("Top performers (by hashrate)", &report.rankings.top_hashrate);
    print_ranking("Most efficient (lowest J/TH)", &report.rankings.most_efficient);
    if let Some(path) = &report.results_path {
        println!("\nResults saved to {path}");
    }
}

fn print_ranking(title: &str, entries: &[BenchmarkEntry]) {
    println!("\n{title}:");
    for (i, entry) in entries.iter().enumerate() {
        let m = &entry.measurement;
        let vr = m
            .average_vr_temp_c
            .map(|t| format!(", VR {t:.1} °C"))
            .unwrap_or_default();
        println!(
            "  {}. {} | {:.2} GH/s | {:.2} J/TH | {:.1} °C{vr}",
            i + 1,
            entry.point,
            m.average_hashrate_ghs,
            m.efficiency_jth,
            m.average_chip_temp_c,
        );
    }
}
