//! Subcommand implementations.
//!
//! Patchbay calls block on round trips with the PipeWire thread, so they
//! run on the blocking pool.

use std::collections::BTreeSet;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::sync::mpsc;
use tokio::task::spawn_blocking;
use tracing::{info, warn};

use venmic_core::{Config, FilterRule, GraphBackend, LinkReport, Patchbay, PropertyMap};
use venmic_pipewire::PipeWirePatchbay;

use crate::signals;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only print these property keys (all when omitted)
    #[arg(value_name = "KEY")]
    pub keys: Vec<String>,

    /// Print JSON instead of key=value lines
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Property key to match
    #[arg(long)]
    pub key: String,

    /// Value the property must have
    #[arg(long)]
    pub value: String,

    /// `include` links matching streams, `exclude` links all others
    #[arg(long, default_value = "include")]
    pub mode: String,
}

async fn patchbay(config: Config) -> Result<Arc<PipeWirePatchbay>> {
    spawn_blocking(move || venmic_pipewire::instance_with(&config))
        .await
        .context("Patchbay task panicked")?
        .context("Failed to connect to PipeWire")
}

pub async fn list(config: Config, args: ListArgs) -> Result<ExitCode> {
    let patchbay = patchbay(config).await?;
    let keys: BTreeSet<String> = args.keys.into_iter().collect();

    let listed = spawn_blocking(move || patchbay.list(&keys)).await.context("List task panicked")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&listed).context("Failed to encode streams")?);
    } else {
        print_plain(&listed);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_plain(listed: &[PropertyMap]) {
    for (index, properties) in listed.iter().enumerate() {
        if index > 0 {
            println!();
        }
        for (key, value) in properties {
            println!("{key}={value}");
        }
    }
}

pub async fn link(config: Config, args: LinkArgs) -> Result<ExitCode> {
    let rule = FilterRule::parse(&args.key, &args.value, &args.mode).context("Invalid rule")?;

    // Installed first so an interrupt while linking still unlinks
    let shutdown = signals::setup_signal_handlers()?;
    let patchbay = patchbay(config).await?;

    let report = track(patchbay, rule, shutdown).await?;
    Ok(if report.is_clean() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Link `rule`, keep it active until `shutdown` fires, then unlink.
///
/// Returns the unlink report. A failed link is unlinked before its error is
/// returned.
async fn track<B>(patchbay: Arc<Patchbay<B>>, rule: FilterRule, mut shutdown: mpsc::Receiver<()>) -> Result<LinkReport>
where
    B: GraphBackend + Send + Sync + 'static,
{
    let linked = {
        let patchbay = Arc::clone(&patchbay);
        spawn_blocking(move || patchbay.link(rule)).await.context("Link task panicked")?
    };

    let linked = match linked {
        Ok(report) => report,
        Err(e) => {
            let report = spawn_blocking(move || patchbay.unlink()).await.context("Unlink task panicked")?;
            log_report("Unlinked", &report);
            return Err(e).context("Failed to link streams");
        }
    };
    log_report("Linked", &linked);

    info!("Tracking streams. Press Ctrl+C to unlink and exit.");
    shutdown.recv().await;

    let report = spawn_blocking(move || patchbay.unlink()).await.context("Unlink task panicked")?;
    log_report("Unlinked", &report);
    Ok(report)
}

fn log_report(action: &str, report: &LinkReport) {
    info!(
        created = report.created,
        removed = report.removed,
        failed = report.failures.len(),
        "{action}"
    );
    if report.target_missing {
        warn!("Virtual microphone not found yet, waiting for it to appear");
    }
    for failure in &report.failures {
        warn!(error = %failure, "Link operation failed");
    }
}

pub async fn has_pipewire() -> Result<ExitCode> {
    let available = spawn_blocking(venmic_pipewire::has_pipewire).await.context("Probe task panicked")?;

    info!(available, "PipeWire availability");
    Ok(if available { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
