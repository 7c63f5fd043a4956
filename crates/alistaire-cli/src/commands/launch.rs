//! Launch command implementation.

use anyhow::{Context, Result};
use console::style;

use alistaire_cli::{
    ConsoleHost, DemoJob, Renderer, Settings, build_dispatcher, configure_terminal, load_json,
    load_model, participate,
};

use super::common::{credential_for, dispatch, print_distribution};

/// Execute the launch command.
pub async fn execute(settings: &Settings, backend: Option<&str>) -> Result<()> {
    println!("{} Launching Alistaire\n", style("→").cyan().bold());

    let mut host = ConsoleHost::new();
    let mut sync = ConsoleHost::new();
    configure_terminal(settings, &mut host, &mut sync)?;

    let model = load_model(&settings.files.model).context("Failed to load model")?;
    println!(
        "\n  Loaded model: {} ({} bytes)",
        style(model.path().display()).green(),
        model.size()
    );

    let data = load_json(&settings.files.data).context("Failed to load data")?;
    println!(
        "  Loaded data: {} ({} keys)",
        style(settings.files.data.display()).green(),
        data.len()
    );

    let backend_id = backend.unwrap_or(&settings.dispatch.backend);
    let shots = settings.dispatch.shots;
    println!(
        "\n{} Running bell job on {} ({} shots)",
        style("→").cyan().bold(),
        style(backend_id).yellow(),
        shots
    );

    let dispatcher = build_dispatcher(settings)?;
    let credential = credential_for(settings, backend_id).await?;
    let mut job = DemoJob::Bell.build(&dispatcher)?;
    let distribution = dispatch(
        &dispatcher,
        &credential,
        backend_id,
        &mut job,
        shots,
        settings.timeout(),
    )
    .await?;
    print_distribution(&distribution);

    host.run_terminal()?;

    println!();
    participate(settings, &mut host)?;

    println!("\nEnjoy using {}", style("*Alistaire Winks*").magenta().bold());
    Ok(())
}
