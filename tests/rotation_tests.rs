//! Refresh rotation with a caller-owned revocation store.

mod common;

use async_trait::async_trait;
use messenger_auth::revocation::{ensure_not_revoked, RevocationStore};
use messenger_auth::{AuthError, ErrorCode, IssueClaims, TokenKind, TokenService};
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
struct MemoryStore {
    revoked: Mutex<HashSet<String>>,
}

impl MemoryStore {
    fn revoke(&self, jti: &str) {
        self.revoked.lock().unwrap().insert(jti.to_string());
    }
}

#[async_trait]
impl RevocationStore for MemoryStore {
    async fn is_revoked(&self, jti: &str) -> Result<bool, AuthError> {
        Ok(self.revoked.lock().unwrap().contains(jti))
    }
}

/// Single-use rotation as a deployment would wire it.
async fn rotate_once(
    service: &TokenService,
    store: &MemoryStore,
    refresh: &str,
) -> Result<(String, String), AuthError> {
    let claims = service.verify(refresh).await?;
    ensure_not_revoked(&claims, store, true).await?;
    let rotated = service.rotate_refresh(refresh).await?;
    store.revoke(&rotated.consumed_jti);
    Ok((rotated.access, rotated.refresh))
}

#[tokio::test]
async fn test_revoking_consumed_jti_keeps_new_tokens_valid() {
    let service = common::hmac_service();
    let store = MemoryStore::default();
    let refresh = service
        .sign(TokenKind::Refresh, IssueClaims::new("u1").role("member"))
        .await
        .unwrap();

    let (access, next_refresh) = rotate_once(&service, &store, &refresh).await.unwrap();

    let access_claims = service.verify(&access).await.unwrap();
    assert!(ensure_not_revoked(&access_claims, &store, true).await.is_ok());
    let refresh_claims = service.verify(&next_refresh).await.unwrap();
    assert!(ensure_not_revoked(&refresh_claims, &store, true).await.is_ok());
}

#[tokio::test]
async fn test_replayed_refresh_token_is_revoked() {
    let service = common::hmac_service();
    let store = MemoryStore::default();
    let refresh = service
        .sign(TokenKind::Refresh, IssueClaims::new("u1"))
        .await
        .unwrap();

    rotate_once(&service, &store, &refresh).await.unwrap();

    let err = rotate_once(&service, &store, &refresh).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Revoked);
    assert_eq!(err.status().as_u16(), 401);
}

#[tokio::test]
async fn test_rotation_chain_stays_usable() {
    let service = common::hmac_service();
    let store = MemoryStore::default();
    let mut refresh = service
        .sign(TokenKind::Refresh, IssueClaims::new("u1"))
        .await
        .unwrap();

    let mut seen = HashSet::new();
    for _ in 0..5 {
        let (access, next) = rotate_once(&service, &store, &refresh).await.unwrap();
        let claims = service.verify(&access).await.unwrap();
        assert!(seen.insert(claims.jti), "access jti reused across rotations");
        refresh = next;
    }
}
