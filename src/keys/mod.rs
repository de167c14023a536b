//! Key providers.
//!
//! A [`KeyProvider`] owns the key material for one algorithm family and
//! hands out the signing key and the verification key separately. Key
//! material is resolved lazily on first use and cached for the lifetime of
//! the provider; concurrent first calls share a single resolution.

pub mod hmac;
pub mod rsa;
pub mod source;

pub use hmac::HmacKeyProvider;
pub use rsa::RsaKeyProvider;
pub use source::{KeySource, SourceKind};

use crate::config::{Config, JwtAlgorithm};
use crate::error::AuthError;
use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::sync::Arc;

/// Supplies signing and verification keys.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Algorithm family this provider serves.
    fn algorithm(&self) -> JwtAlgorithm;

    /// Key used to sign new tokens.
    async fn active_key(&self) -> Result<&EncodingKey, AuthError>;

    /// Key used to verify presented tokens.
    async fn verify_key(&self) -> Result<&DecodingKey, AuthError>;

    /// Key id embedded in the token header.
    fn key_id(&self) -> Option<&str> {
        None
    }
}

/// Build the provider matching the configured algorithm.
///
/// Key material is moved into the provider; nothing is read until first use.
#[must_use]
pub fn provider_from_config(config: Config) -> Arc<dyn KeyProvider> {
    let keys = config.keys;
    match config.security.algorithm {
        JwtAlgorithm::HS256 => {
            let mut provider = HmacKeyProvider::new(keys.hmac_secret);
            if let Some(kid) = keys.key_id {
                provider = provider.with_key_id(kid);
            }
            if keys.development_fallback {
                provider = provider.with_development_fallback();
            }
            Arc::new(provider)
        }
        JwtAlgorithm::RS256 => {
            let mut provider = RsaKeyProvider::new(keys.rsa_private_key, keys.rsa_public_key);
            if let Some(kid) = keys.key_id {
                provider = provider.with_key_id(kid);
            }
            Arc::new(provider)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;

    #[test]
    fn test_provider_matches_algorithm() {
        let hs = provider_from_config(Config::default());
        assert_eq!(hs.algorithm(), JwtAlgorithm::HS256);

        let rs = provider_from_config(Config {
            security: SecurityConfig::default().with_algorithm(JwtAlgorithm::RS256),
            ..Config::default()
        });
        assert_eq!(rs.algorithm(), JwtAlgorithm::RS256);
    }

    #[test]
    fn test_key_id_carried_over() {
        let mut config = Config::default();
        config.keys.key_id = Some("kid-1".to_string());
        let provider = provider_from_config(config);
        assert_eq!(provider.key_id(), Some("kid-1"));
    }
}
