//! Credentials and token providers.
//!
//! A [`Credential`] wraps an opaque bearer token. Its `Debug` output never
//! shows the token, and nothing in this crate serializes or logs it.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{HalError, HalResult};

/// Default environment variable read by [`EnvTokenProvider::alistaire`].
pub const DEFAULT_TOKEN_ENV: &str = "ALISTAIRE_TOKEN";

/// An opaque access token with an optional expiry.
#[derive(Clone)]
pub struct Credential {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Credential {
    /// Wrap a token that does not expire.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    /// Set the expiry instant.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// The raw token, for placing in an authorization header.
    pub fn expose_secret(&self) -> &str {
        &self.token
    }

    /// Expiry instant, if any.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the credential expired before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// Whether the credential has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Reject empty or expired credentials.
    pub fn check(&self) -> HalResult<()> {
        if self.token.trim().is_empty() {
            return Err(HalError::Authentication("credential is empty".into()));
        }
        if self.is_expired() {
            return Err(HalError::Authentication("credential has expired".into()));
        }
        Ok(())
    }
}

/// Token provider trait for dependency injection.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain a credential.
    async fn credential(&self) -> HalResult<Credential>;

    /// Check if a credential is available without fetching it.
    fn has_credential(&self) -> bool;
}

/// Reads the token from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    env_var: String,
}

impl EnvTokenProvider {
    /// Create a provider for `env_var`.
    pub fn new(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }

    /// Provider for `ALISTAIRE_TOKEN`.
    pub fn alistaire() -> Self {
        Self::new(DEFAULT_TOKEN_ENV)
    }

    /// Name of the variable read.
    pub fn env_var(&self) -> &str {
        &self.env_var
    }
}

#[async_trait::async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn credential(&self) -> HalResult<Credential> {
        let token = std::env::var(&self.env_var).map_err(|_| {
            HalError::Authentication(format!("Environment variable {} not set", self.env_var))
        })?;
        let credential = Credential::new(token);
        credential.check()?;
        Ok(credential)
    }

    fn has_credential(&self) -> bool {
        std::env::var(&self.env_var).is_ok_and(|v| !v.trim().is_empty())
    }
}

/// Hands out a fixed credential.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    credential: Credential,
}

impl StaticTokenProvider {
    /// Provider that always returns `credential`.
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn credential(&self) -> HalResult<Credential> {
        self.credential.check()?;
        Ok(self.credential.clone())
    }

    fn has_credential(&self) -> bool {
        self.credential.check().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_debug_redacts_token() {
        let cred = Credential::new("super-secret-token");
        let debug = format!("{cred:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_empty_credential_rejected() {
        let err = Credential::new("  ").check().unwrap_err();
        assert!(matches!(err, HalError::Authentication(_)));
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let cred = Credential::new("t").with_expiry(now - Duration::seconds(1));
        assert!(cred.is_expired());
        assert!(cred.check().is_err());

        let fresh = Credential::new("t").with_expiry(now + Duration::hours(1));
        assert!(!fresh.is_expired());
        assert!(fresh.check().is_ok());
    }

    #[tokio::test]
    async fn test_env_provider_missing_variable() {
        let provider = EnvTokenProvider::new("ALISTAIRE_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert!(!provider.has_credential());
        let err = provider.credential().await.unwrap_err();
        assert!(matches!(err, HalError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticTokenProvider::new(Credential::new("abc"));
        assert!(provider.has_credential());
        assert_eq!(provider.credential().await.unwrap().expose_secret(), "abc");
    }
}
