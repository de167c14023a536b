//! Refresh-token rotation.
//!
//! Rotation is stateless: the consumed refresh token is not invalidated
//! server-side and stays valid until its own `exp`. Deployments that need
//! single-use refresh tokens wire a [`RevocationStore`] and revoke
//! [`RotatedTokens::consumed_jti`] themselves. Both new tokens carry fresh
//! identifiers, so revoking the consumed one never affects them.
//!
//! [`RevocationStore`]: crate::revocation::RevocationStore

use crate::error::AuthError;
use crate::jwt::{Claims, IssueClaims, TokenKind};
use crate::service::TokenService;
use tracing::{info, instrument, warn};

/// Result of a rotation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatedTokens {
    /// New access token with a freshly generated `jti`
    pub access: String,
    /// New refresh token with a freshly generated `jti`
    pub refresh: String,
    /// Claim-set the new tokens were issued from
    pub claims: Claims,
    /// Identifier of the refresh token that was exchanged
    pub consumed_jti: String,
}

impl TokenService {
    /// Exchange a refresh token for a new access/refresh pair.
    ///
    /// # Errors
    ///
    /// Propagates `verify` failures and returns `forbidden` for a token
    /// that is not a refresh token.
    pub async fn rotate_refresh(&self, refresh_token: &str) -> Result<RotatedTokens, AuthError> {
        self.rotate_refresh_with(refresh_token, |claims| claims).await
    }

    /// Like [`TokenService::rotate_refresh`], applying `mutate` to the
    /// verified claim-set first, e.g. to pick up a changed role or team.
    ///
    /// # Errors
    ///
    /// Propagates `verify` and `sign` failures and returns `forbidden` for
    /// a token that is not a refresh token.
    #[instrument(skip_all)]
    pub async fn rotate_refresh_with<F>(
        &self,
        refresh_token: &str,
        mutate: F,
    ) -> Result<RotatedTokens, AuthError>
    where
        F: FnOnce(Claims) -> Claims + Send,
    {
        let verified = self.verify(refresh_token).await?;
        if verified.token_type != TokenKind::Refresh {
            warn!(
                sub = %verified.sub,
                jti = %verified.jti,
                token_type = %verified.token_type,
                "Rejected non-refresh token at rotation"
            );
            return Err(AuthError::forbidden("refresh token required"));
        }

        let consumed_jti = verified.jti.clone();
        let claims = mutate(verified);

        let access = self
            .sign(
                TokenKind::Access,
                IssueClaims::from(claims.clone()).with_fresh_jti(),
            )
            .await?;
        let refresh = self
            .sign(
                TokenKind::Refresh,
                IssueClaims::from(claims.clone()).with_fresh_jti(),
            )
            .await?;

        info!(
            sub = %claims.sub,
            consumed_jti = %consumed_jti,
            "Rotated refresh token"
        );

        Ok(RotatedTokens {
            access,
            refresh,
            claims,
            consumed_jti,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;
    use crate::error::ErrorCode;
    use crate::keys::HmacKeyProvider;
    use std::sync::Arc;

    fn service() -> TokenService {
        TokenService::new(
            SecurityConfig::default(),
            Arc::new(HmacKeyProvider::from_secret("rotation-test-secret")),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_rotation_rejects_access_token() {
        let service = service();
        let access = service
            .sign(TokenKind::Access, IssueClaims::new("u1"))
            .await
            .unwrap();

        let err = service.rotate_refresh(&access).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);
        assert_eq!(err.status(), http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_rotation_issues_pair() {
        let service = service();
        let refresh = service
            .sign(TokenKind::Refresh, IssueClaims::new("u1").role("member"))
            .await
            .unwrap();
        let original = service.verify(&refresh).await.unwrap();

        let rotated = service.rotate_refresh(&refresh).await.unwrap();
        let access = service.verify(&rotated.access).await.unwrap();
        let new_refresh = service.verify(&rotated.refresh).await.unwrap();

        assert_eq!(access.token_type, TokenKind::Access);
        assert_eq!(new_refresh.token_type, TokenKind::Refresh);
        assert_eq!(rotated.consumed_jti, original.jti);
        assert_ne!(access.jti, original.jti);
        assert_ne!(new_refresh.jti, original.jti);
        assert_ne!(new_refresh.jti, access.jti);
        assert_eq!(rotated.claims.sub, "u1");
    }

    #[tokio::test]
    async fn test_rotation_applies_mutation() {
        let service = service();
        let refresh = service
            .sign(TokenKind::Refresh, IssueClaims::new("u1").role("member"))
            .await
            .unwrap();

        let rotated = service
            .rotate_refresh_with(&refresh, |mut claims| {
                claims.role_id = Some("admin".to_string());
                claims.team_id = Some("t9".to_string());
                claims
            })
            .await
            .unwrap();

        let access = service.verify(&rotated.access).await.unwrap();
        assert_eq!(access.role_id.as_deref(), Some("admin"));
        assert_eq!(access.team_id.as_deref(), Some("t9"));
        assert_eq!(rotated.claims.role_id.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_consumed_refresh_token_stays_valid() {
        let service = service();
        let refresh = service
            .sign(TokenKind::Refresh, IssueClaims::new("u1"))
            .await
            .unwrap();

        service.rotate_refresh(&refresh).await.unwrap();
        assert!(service.rotate_refresh(&refresh).await.is_ok());
    }
}
