//! HMAC-SHA256 key provider.

use crate::config::{JwtAlgorithm, DEVELOPMENT_SECRET};
use crate::error::AuthError;
use crate::keys::source::{KeySource, SourceKind};
use crate::keys::KeyProvider;
use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::OnceCell;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// Keys derived from the resolved secret.
struct HmacKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// HMAC key provider with a lazily resolved, memoized secret.
pub struct HmacKeyProvider {
    source: KeySource,
    key_id: Option<String>,
    development_fallback: bool,
    keys: OnceCell<HmacKeys>,
    resolutions: AtomicUsize,
}

impl HmacKeyProvider {
    /// Create a provider reading the secret from `source`.
    #[must_use]
    pub fn new(source: KeySource) -> Self {
        Self {
            source,
            key_id: None,
            development_fallback: false,
            keys: OnceCell::new(),
            resolutions: AtomicUsize::new(0),
        }
    }

    /// Provider for a secret known up front.
    #[must_use]
    pub fn from_secret(secret: impl Into<String>) -> Self {
        Self::new(KeySource::literal(secret))
    }

    /// Set the key id embedded in token headers.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// Use the fixed development secret when nothing else resolves.
    ///
    /// Never enable this in production.
    #[must_use]
    pub fn with_development_fallback(mut self) -> Self {
        self.development_fallback = true;
        self
    }

    /// Number of times the secret has been resolved. At most one.
    #[must_use]
    pub fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }

    async fn keys(&self) -> Result<&HmacKeys, AuthError> {
        self.keys.get_or_try_init(|| self.load()).await
    }

    async fn load(&self) -> Result<HmacKeys, AuthError> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);

        let (secret, kind) = match self.source.resolve().await? {
            Some(found) => found,
            None if self.development_fallback => {
                warn!(
                    "No HMAC secret configured, falling back to the built-in development secret. \
                     Tokens signed now are forgeable by anyone with this source code"
                );
                (Zeroizing::new(DEVELOPMENT_SECRET.to_string()), SourceKind::Fallback)
            }
            None => {
                return Err(AuthError::configuration(format!(
                    "No HMAC secret configured ({:?})",
                    self.source
                )))
            }
        };

        info!(source = %kind, "Resolved HMAC signing secret");

        Ok(HmacKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }
}

#[async_trait]
impl KeyProvider for HmacKeyProvider {
    fn algorithm(&self) -> JwtAlgorithm {
        JwtAlgorithm::HS256
    }

    async fn active_key(&self) -> Result<&EncodingKey, AuthError> {
        Ok(&self.keys().await?.encoding)
    }

    async fn verify_key(&self) -> Result<&DecodingKey, AuthError> {
        Ok(&self.keys().await?.decoding)
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }
}
