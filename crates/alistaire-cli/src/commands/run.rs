//! Run command implementation.

use std::time::Duration;

use anyhow::Result;
use console::style;

use alistaire_cli::{DemoJob, Settings, build_dispatcher, parse_shots};

use super::common::{credential_for, dispatch, print_distribution};

/// Execute the run command.
pub async fn execute(
    settings: &Settings,
    job: DemoJob,
    shots: Option<i64>,
    backend: Option<&str>,
    timeout: Option<u64>,
) -> Result<()> {
    let shots = match shots {
        Some(n) => parse_shots(n)?,
        None => settings.dispatch.shots,
    };
    let backend_id = backend.unwrap_or(&settings.dispatch.backend);
    let timeout = timeout.map_or_else(|| settings.timeout(), Duration::from_secs);

    let dispatcher = build_dispatcher(settings)?;
    let mut description = job.build(&dispatcher)?;

    println!(
        "{} Running {} on {} ({} shots)",
        style("→").cyan().bold(),
        style(description.name()).green(),
        style(backend_id).yellow(),
        shots
    );
    println!(
        "  Job: {} slots, {} operations",
        description.slot_count(),
        description.len()
    );

    let credential = credential_for(settings, backend_id).await?;
    let distribution = dispatch(
        &dispatcher,
        &credential,
        backend_id,
        &mut description,
        shots,
        timeout,
    )
    .await?;

    print_distribution(&distribution);
    if let Some((label, count)) = distribution.most_frequent() {
        println!(
            "\n  Most frequent: {} ({} of {})",
            style(label).cyan(),
            count,
            distribution.total()
        );
    }

    Ok(())
}
