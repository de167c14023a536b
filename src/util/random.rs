//! Cryptographically secure identifiers.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;

/// Random URL-safe identifier built from `bytes` bytes of entropy.
#[must_use]
pub fn random_id(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

/// Fresh token identifier (`jti`).
#[must_use]
pub fn generate_jti() -> String {
    uuid::Uuid::new_v4().to_string()
}
