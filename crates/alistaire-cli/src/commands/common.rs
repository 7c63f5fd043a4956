//! Shared helpers for CLI commands.

use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use alistaire_cli::{SIMULATOR_BACKEND, Settings, resolve_credential};
use alistaire_hal::{Credential, Dispatcher, EnvTokenProvider, HalError, OutcomeDistribution};
use alistaire_ir::JobDescription;

/// Credential for `backend_id`.
///
/// The local simulator runs without a configured token.
pub async fn credential_for(settings: &Settings, backend_id: &str) -> Result<Credential> {
    let resolved = resolve_credential(
        &settings.files.secrets,
        &settings.files.token_key,
        &EnvTokenProvider::alistaire(),
    )
    .await;

    match resolved {
        Ok((credential, _)) => Ok(credential),
        Err(_) if backend_id == SIMULATOR_BACKEND => Ok(Credential::new("local")),
        Err(e) => Err(e).with_context(|| {
            format!(
                "No credential for '{backend_id}': add '{}' to {} or set ALISTAIRE_TOKEN",
                settings.files.token_key,
                settings.files.secrets.display()
            )
        }),
    }
}

/// Resolve, submit and wait, with a spinner while the job runs.
///
/// A job that outlives `timeout` is cancelled when the backend allows it.
pub async fn dispatch(
    dispatcher: &Dispatcher,
    credential: &Credential,
    backend_id: &str,
    job: &mut JobDescription,
    shots: u32,
    timeout: Duration,
) -> Result<OutcomeDistribution> {
    let spinner = spinner(format!("Connecting to {backend_id}..."));

    let backend = dispatcher.resolve_backend(credential, backend_id).await?;
    spinner.set_message("Submitting job...");
    let mut handle = dispatcher.submit(&backend, job, shots).await?;
    spinner.set_message(format!("Running job {}...", handle.job_id()));

    let outcome = dispatcher.await_result(&mut handle, timeout).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(distribution) => Ok(distribution),
        Err(e) => {
            if matches!(e.kind(), HalError::TimeoutExceeded(_))
                && backend.capabilities().supports_cancel
            {
                if let Err(cancel_err) = dispatcher.cancel(&mut handle).await {
                    warn!("Could not cancel job {}: {}", handle.job_id(), cancel_err);
                }
            }
            Err(e.into())
        }
    }
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Print an outcome distribution as a table.
pub fn print_distribution(distribution: &OutcomeDistribution) {
    println!(
        "\n{} Results ({} shots):",
        style("✓").green().bold(),
        distribution.shots()
    );

    let sorted = distribution.sorted();
    for (label, count) in sorted.iter().take(16) {
        let prob = distribution.probability(label) * 100.0;
        let bar_len = (prob / 2.0).round() as usize;
        let bar: String = "█".repeat(bar_len);

        println!(
            "  {}: {:>6} ({:>5.2}%) {}",
            style(label).cyan(),
            count,
            prob,
            style(bar).green()
        );
    }

    if sorted.len() > 16 {
        println!("  ... and {} more outcomes", sorted.len() - 16);
    }
}
