//! Config command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use alistaire_cli::{CredentialSource, Settings, resolve_credential};
use alistaire_hal::EnvTokenProvider;

/// Execute the config command.
pub async fn execute(settings: &Settings, config_file: Option<&Path>) -> Result<()> {
    let source = match config_file {
        Some(path) => path.display().to_string(),
        None => match Settings::default_path() {
            Some(path) if path.exists() => path.display().to_string(),
            _ => "defaults".to_string(),
        },
    };
    println!("{} Settings ({})\n", style("→").cyan().bold(), style(source).dim());

    let yaml = serde_yaml_ng::to_string(settings).context("Failed to render settings")?;
    print!("{yaml}");

    let provider = EnvTokenProvider::alistaire();
    let token = match resolve_credential(
        &settings.files.secrets,
        &settings.files.token_key,
        &provider,
    )
    .await
    {
        Ok((_, CredentialSource::SecretsFile)) => format!(
            "[REDACTED] (from {})",
            settings.files.secrets.display()
        ),
        Ok((_, CredentialSource::Fallback)) => {
            format!("[REDACTED] (from {})", provider.env_var())
        }
        Err(e) => format!("not available: {e}"),
    };
    println!("\n{} {}", style("token:").bold(), token);

    Ok(())
}
