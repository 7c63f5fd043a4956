//! Backends command implementation.

use anyhow::Result;
use console::style;

use alistaire_cli::{Settings, build_dispatcher};
use alistaire_hal::{Backend, DispatchError, Dispatcher};

use super::common::credential_for;

/// Execute the backends command.
pub async fn execute(settings: &Settings) -> Result<()> {
    println!("{} Available backends:\n", style("Alistaire").cyan().bold());

    let dispatcher = build_dispatcher(settings)?;

    for name in dispatcher.registry().available_backends() {
        show(&dispatcher, settings, &name).await;
    }

    println!(
        "  {} {}",
        style("Remote service:").bold(),
        style(&settings.dispatch.service_url).underlined()
    );
    println!();

    let configured = &settings.dispatch.backend;
    if dispatcher.registry().has_backend(configured) {
        return Ok(());
    }
    match credential_for(settings, configured).await {
        Ok(_) => show(&dispatcher, settings, configured).await,
        Err(e) => {
            println!("  {} {}", style("○").yellow(), style(configured).bold());
            println!("    {e:#}");
        }
    }

    Ok(())
}

async fn show(dispatcher: &Dispatcher, settings: &Settings, name: &str) {
    let resolved = match credential_for(settings, name).await {
        Ok(credential) => dispatcher
            .resolve_backend(&credential, name)
            .await
            .map_err(anyhow::Error::from),
        Err(e) => Err(e),
    };

    match resolved {
        Ok(backend) => print_backend(backend.as_ref()),
        Err(e) => {
            let retry = e
                .downcast_ref::<DispatchError>()
                .is_some_and(DispatchError::is_retryable);
            println!(
                "  {} {}",
                if retry {
                    style("○").yellow()
                } else {
                    style("○").red()
                },
                style(name).bold()
            );
            println!("    {e}");
            println!();
        }
    }
}

fn print_backend(backend: &dyn Backend) {
    let caps = backend.capabilities();
    println!(
        "  {} {} {}",
        style("●").green(),
        style(backend.name()).bold(),
        if caps.is_simulator { "(simulator)" } else { "" }
    );
    println!("    Slots: {}", caps.num_slots);
    println!("    Max shots: {}", caps.max_shots);
    println!(
        "    Cancel: {}",
        if caps.supports_cancel { "yes" } else { "no" }
    );
    if !caps.supported_operations.is_empty() {
        println!("    Operations: {}", caps.supported_operations.join(", "));
    }
    println!();
}
