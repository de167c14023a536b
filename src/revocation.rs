//! Revocation extension point.
//!
//! `verify` never consults storage. When the revocation flag is enabled the
//! boundary layer calls [`ensure_not_revoked`] with its own store after a
//! successful `verify`.

use crate::error::AuthError;
use crate::jwt::Claims;
use async_trait::async_trait;
use tracing::warn;

/// External store of revoked token identifiers.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Whether the token identifier has been revoked.
    async fn is_revoked(&self, jti: &str) -> Result<bool, AuthError>;
}

/// Fail with `revoked` if checking is enabled and the store lists the `jti`.
///
/// # Errors
///
/// Returns `revoked`, or whatever error the store raises.
pub async fn ensure_not_revoked<'a>(
    claims: &'a Claims,
    store: &dyn RevocationStore,
    enabled: bool,
) -> Result<&'a Claims, AuthError> {
    if enabled && store.is_revoked(&claims.jti).await? {
        warn!(sub = %claims.sub, jti = %claims.jti, "Revoked token presented");
        return Err(AuthError::revoked());
    }
    Ok(claims)
}
