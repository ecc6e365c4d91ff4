//! Signing credential resolution
//!
//! Produces the process-lifetime [`SigningCredentials`] from either plaintext
//! configuration or a secrets-manager entry. There is no caching: call
//! [`CredentialResolver::resolve`] once at startup and pass the result to the
//! components that need it.
//!
//! All secret material is held in [`SecretString`], which zeroes its buffer on
//! drop and redacts itself in `Debug`.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::KeyManagerConfig;
use crate::error::{BuildError, ResolveError};
use crate::evm::builder::build_keys;

/// Access to a secrets manager
///
/// Implementations own transport, authentication and the backend's security
/// model. They return the raw secret string for `name` in `region`.
#[async_trait]
pub trait SecretsBackend: Send + Sync {
    async fn fetch_secret(&self, name: &str, region: &str) -> eyre::Result<SecretString>;
}

/// Backend for deployments that only use local keys. Every fetch fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSecretsBackend;

#[async_trait]
impl SecretsBackend for NoSecretsBackend {
    async fn fetch_secret(&self, name: &str, _region: &str) -> eyre::Result<SecretString> {
        Err(eyre::eyre!("no secrets backend configured for {}", name))
    }
}

/// Keys used by the relay for the lifetime of the process
///
/// The field names (and their legacy aliases) are the JSON layout of the
/// remote secret document.
#[derive(Debug, Deserialize)]
pub struct SigningCredentials {
    pub hmac_key: SecretString,
    pub admin_api_key: SecretString,
    pub admin_secret_key: SecretString,
    /// Hex ECDSA key for chain A
    #[serde(alias = "eth_private_key")]
    pub chain_a_private_key: SecretString,
    /// Hex ECDSA key for chain B
    #[serde(alias = "bsc_private_key")]
    pub chain_b_private_key: SecretString,
}

impl SigningCredentials {
    /// Signer and address for chain A transactions
    pub fn chain_a_signer(&self) -> Result<(PrivateKeySigner, Address), BuildError> {
        build_keys(self.chain_a_private_key.expose_secret())
    }

    /// Signer and address for chain B transactions
    pub fn chain_b_signer(&self) -> Result<(PrivateKeySigner, Address), BuildError> {
        build_keys(self.chain_b_private_key.expose_secret())
    }
}

/// Resolves [`KeyManagerConfig`] into [`SigningCredentials`]
pub struct CredentialResolver<B> {
    backend: B,
    timeout: Duration,
}

impl<B: SecretsBackend> CredentialResolver<B> {
    /// `timeout` bounds the secrets-manager round-trip
    pub fn new(backend: B, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Resolve credentials. Failures are returned as-is; retry policy belongs
    /// to the caller.
    pub async fn resolve(
        &self,
        config: &KeyManagerConfig,
    ) -> Result<SigningCredentials, ResolveError> {
        match config {
            KeyManagerConfig::Local {
                local_hmac_key,
                local_admin_api_key,
                local_admin_secret_key,
                local_chain_a_private_key,
                local_chain_b_private_key,
            } => {
                debug!("Using local signing credentials");
                Ok(SigningCredentials {
                    hmac_key: copy_secret(local_hmac_key),
                    admin_api_key: copy_secret(local_admin_api_key),
                    admin_secret_key: copy_secret(local_admin_secret_key),
                    chain_a_private_key: copy_secret(local_chain_a_private_key),
                    chain_b_private_key: copy_secret(local_chain_b_private_key),
                })
            }
            KeyManagerConfig::Remote {
                aws_secret_name,
                aws_region,
            } => self.resolve_remote(aws_secret_name, aws_region).await,
        }
    }

    async fn resolve_remote(
        &self,
        name: &str,
        region: &str,
    ) -> Result<SigningCredentials, ResolveError> {
        let secret = tokio::time::timeout(self.timeout, self.backend.fetch_secret(name, region))
            .await
            .map_err(|_| ResolveError::SecretTimeout {
                name: name.to_string(),
                region: region.to_string(),
                timeout: self.timeout,
            })?
            .map_err(|e| ResolveError::SecretFetch {
                name: name.to_string(),
                region: region.to_string(),
                reason: e.to_string(),
            })?;

        let credentials: SigningCredentials = serde_json::from_str(secret.expose_secret())
            .map_err(|e| ResolveError::SecretFormat {
                name: name.to_string(),
                line: e.line(),
                column: e.column(),
            })?;

        info!(secret_name = %name, region = %region, "Resolved signing credentials from secrets manager");
        Ok(credentials)
    }
}

fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_string())
}
