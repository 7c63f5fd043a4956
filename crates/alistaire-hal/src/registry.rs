//! Backend registry.
//!
//! The [`BackendRegistry`] maps backend identifiers to connectors. An
//! optional fallback connector handles identifiers that were not registered
//! by name, which is how a remote service exposing many queues is plugged in.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::auth::Credential;
use crate::backend::{Backend, BackendConnector};
use crate::error::{HalError, HalResult};

/// Central registry of backend connectors.
#[derive(Default)]
pub struct BackendRegistry {
    connectors: FxHashMap<String, Arc<dyn BackendConnector>>,
    fallback: Option<Arc<dyn BackendConnector>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connector for one backend identifier.
    pub fn register(&mut self, name: impl Into<String>, connector: impl BackendConnector + 'static) {
        let name = name.into();
        debug!("Registering backend: {}", name);
        self.connectors.insert(name, Arc::new(connector));
    }

    /// Route every unregistered identifier to `connector`.
    pub fn set_fallback(&mut self, connector: impl BackendConnector + 'static) {
        debug!("Registering fallback connector");
        self.fallback = Some(Arc::new(connector));
    }

    /// Resolve `backend_id` with `credential`.
    ///
    /// The credential is checked locally before any connector runs.
    pub async fn resolve(
        &self,
        credential: &Credential,
        backend_id: &str,
    ) -> HalResult<Arc<dyn Backend>> {
        credential.check()?;

        let connector = self
            .connectors
            .get(backend_id)
            .or(self.fallback.as_ref())
            .ok_or_else(|| {
                HalError::BackendUnavailable(format!(
                    "No backend registered with name '{backend_id}'"
                ))
            })?;

        debug!("Connecting to backend: {}", backend_id);
        connector.connect(credential, backend_id).await
    }

    /// Names registered explicitly, sorted.
    pub fn available_backends(&self) -> Vec<String> {
        let mut names: Vec<_> = self.connectors.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether `name` is registered explicitly.
    pub fn has_backend(&self, name: &str) -> bool {
        self.connectors.contains_key(name)
    }

    /// Whether unregistered names are routed to a fallback connector.
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Refusing;

    #[async_trait]
    impl BackendConnector for Refusing {
        async fn connect(&self, _: &Credential, id: &str) -> HalResult<Arc<dyn Backend>> {
            Err(HalError::BackendUnavailable(format!("{id} is offline")))
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = BackendRegistry::new();
        assert!(registry.available_backends().is_empty());
        assert!(!registry.has_backend("simulator"));
        assert!(!registry.has_fallback());
    }

    #[test]
    fn test_available_backends_sorted() {
        let mut registry = BackendRegistry::new();
        registry.register("zebra", Refusing);
        registry.register("alpha", Refusing);
        assert_eq!(registry.available_backends(), vec!["alpha", "zebra"]);
    }

    #[tokio::test]
    async fn test_unknown_backend_unavailable() {
        let registry = BackendRegistry::new();
        let err = registry
            .resolve(&Credential::new("token"), "nonexistent")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, HalError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_credential_checked_first() {
        let mut registry = BackendRegistry::new();
        registry.register("alpha", Refusing);
        let err = registry
            .resolve(&Credential::new(""), "alpha")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, HalError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_fallback_receives_unregistered_names() {
        let mut registry = BackendRegistry::new();
        registry.set_fallback(Refusing);
        let err = registry
            .resolve(&Credential::new("token"), "ibmq_qasm_simulator")
            .await
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "Backend not available: ibmq_qasm_simulator is offline"
        );
    }
}
