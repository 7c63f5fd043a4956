//! Data file, model and secrets loaders.

use std::path::{Path, PathBuf};

use alistaire_hal::{Credential, TokenProvider};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::error::{LauncherError, LauncherResult};

/// A loaded model file.
///
/// The contents are kept as raw bytes; interpreting them is up to the host.
#[derive(Clone)]
pub struct ModelHandle {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("path", &self.path)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl ModelHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Read a model file into an opaque handle.
#[instrument]
pub fn load_model(path: &Path) -> LauncherResult<ModelHandle> {
    let bytes = std::fs::read(path).map_err(|e| LauncherError::io(path, e))?;
    debug!("Loaded model: {} bytes", bytes.len());
    Ok(ModelHandle {
        path: path.to_path_buf(),
        bytes,
    })
}

/// Read a JSON file whose top level is an object.
#[instrument]
pub fn load_json(path: &Path) -> LauncherResult<Map<String, Value>> {
    let contents = std::fs::read_to_string(path).map_err(|e| LauncherError::io(path, e))?;
    let value: Value = serde_json::from_str(&contents).map_err(|source| LauncherError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(map) => {
            debug!("Loaded {} top-level keys", map.len());
            Ok(map)
        }
        _ => Err(LauncherError::NotAnObject {
            path: path.to_path_buf(),
        }),
    }
}

/// Read the token stored under `key` in a JSON secrets file.
pub fn load_credential(path: &Path, key: &str) -> LauncherResult<Credential> {
    let secrets = load_json(path)?;
    match secrets.get(key).and_then(Value::as_str).map(str::trim) {
        Some(token) if !token.is_empty() => Ok(Credential::new(token)),
        _ => Err(LauncherError::MissingSecret {
            key: key.to_string(),
            path: path.to_path_buf(),
        }),
    }
}

/// Where a credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    SecretsFile,
    Fallback,
}

/// Take the credential from the secrets file, or from `fallback` when the
/// file does not exist.
///
/// A secrets file that exists but cannot be read or lacks the key is an
/// error; it does not fall through.
pub async fn resolve_credential(
    secrets: &Path,
    key: &str,
    fallback: &dyn TokenProvider,
) -> LauncherResult<(Credential, CredentialSource)> {
    if secrets.exists() {
        let credential = load_credential(secrets, key)?;
        return Ok((credential, CredentialSource::SecretsFile));
    }
    debug!(
        "{} not found, using fallback token provider",
        secrets.display()
    );
    let credential = fallback.credential().await?;
    Ok((credential, CredentialSource::Fallback))
}
