//! RSA (RS256) key provider.
//!
//! The private key is only ever used to sign and the public key only to
//! verify. Each is resolved and imported independently, exactly once, so a
//! verify-only deployment needs no private key at all.

use crate::config::JwtAlgorithm;
use crate::error::AuthError;
use crate::keys::source::KeySource;
use crate::keys::KeyProvider;
use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::OnceCell;
use tracing::info;
use zeroize::Zeroizing;

const PRIVATE_LABEL: &str = "PRIVATE KEY";
const PUBLIC_LABEL: &str = "PUBLIC KEY";

/// RSA key provider with lazily imported, cached keys.
pub struct RsaKeyProvider {
    private_source: KeySource,
    public_source: KeySource,
    key_id: Option<String>,
    signing: OnceCell<EncodingKey>,
    verifying: OnceCell<DecodingKey>,
    private_imports: AtomicUsize,
    public_imports: AtomicUsize,
}

impl RsaKeyProvider {
    /// Create a provider from private and public key sources.
    #[must_use]
    pub fn new(private_source: KeySource, public_source: KeySource) -> Self {
        Self {
            private_source,
            public_source,
            key_id: None,
            signing: OnceCell::new(),
            verifying: OnceCell::new(),
            private_imports: AtomicUsize::new(0),
            public_imports: AtomicUsize::new(0),
        }
    }

    /// Provider for PEM strings known up front.
    #[must_use]
    pub fn from_pem(private_pem: impl Into<String>, public_pem: impl Into<String>) -> Self {
        Self::new(KeySource::literal(private_pem), KeySource::literal(public_pem))
    }

    /// Set the key id embedded in token headers.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// Import attempts for the private and public key, in that order.
    ///
    /// Once an import succeeds it is never repeated.
    #[must_use]
    pub fn import_counts(&self) -> (usize, usize) {
        (
            self.private_imports.load(Ordering::SeqCst),
            self.public_imports.load(Ordering::SeqCst),
        )
    }

    async fn import_private(&self) -> Result<EncodingKey, AuthError> {
        self.private_imports.fetch_add(1, Ordering::SeqCst);
        let (raw, kind) = self.private_source.resolve_required("RSA private key").await?;
        let pem = normalize_pem(&raw, PRIVATE_LABEL);
        let key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AuthError::key_import("RSA private key", e))?;
        info!(source = %kind, "Imported RSA signing key");
        Ok(key)
    }

    async fn import_public(&self) -> Result<DecodingKey, AuthError> {
        self.public_imports.fetch_add(1, Ordering::SeqCst);
        let (raw, kind) = self.public_source.resolve_required("RSA public key").await?;
        let pem = normalize_pem(&raw, PUBLIC_LABEL);
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AuthError::key_import("RSA public key", e))?;
        info!(source = %kind, "Imported RSA verification key");
        Ok(key)
    }
}

#[async_trait]
impl KeyProvider for RsaKeyProvider {
    fn algorithm(&self) -> JwtAlgorithm {
        JwtAlgorithm::RS256
    }

    async fn active_key(&self) -> Result<&EncodingKey, AuthError> {
        self.signing.get_or_try_init(|| self.import_private()).await
    }

    async fn verify_key(&self) -> Result<&DecodingKey, AuthError> {
        self.verifying.get_or_try_init(|| self.import_public()).await
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }
}

/// Canonicalize PEM material supplied through env vars or files.
///
/// Escaped `\n` sequences are unescaped. Material without armor is treated
/// as a bare base64 body and wrapped in `label` armor.
fn normalize_pem(raw: &str, label: &str) -> Zeroizing<String> {
    let unescaped = Zeroizing::new(raw.replace("\\n", "\n"));
    let trimmed = unescaped.trim();
    if trimmed.contains("-----BEGIN") {
        return Zeroizing::new(format!("{trimmed}\n"));
    }

    let body: Zeroizing<String> =
        Zeroizing::new(trimmed.chars().filter(|c| !c.is_whitespace()).collect());
    let mut pem = Zeroizing::new(String::with_capacity(body.len() + 64));
    pem.push_str(&format!("-----BEGIN {label}-----\n"));
    for chunk in body.as_bytes().chunks(64) {
        pem.push_str(&String::from_utf8_lossy(chunk));
        pem.push('\n');
    }
    pem.push_str(&format!("-----END {label}-----\n"));
    pem
}
