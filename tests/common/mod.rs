//! Shared fixtures for integration tests.

#![allow(dead_code)]

use messenger_auth::keys::{HmacKeyProvider, RsaKeyProvider};
use messenger_auth::{JwtAlgorithm, SecurityConfig, TokenService};
use std::sync::Arc;

pub const SECRET: &str = "integration-test-secret-key-32-bytes!";
pub const RSA_PRIVATE: &str = include_str!("../fixtures/rsa_private.pem");
pub const RSA_PUBLIC: &str = include_str!("../fixtures/rsa_public.pem");
pub const OTHER_RSA_PUBLIC: &str = include_str!("../fixtures/other_public.pem");

pub fn hmac_service() -> TokenService {
    hmac_service_with(SecurityConfig::default())
}

pub fn hmac_service_with(config: SecurityConfig) -> TokenService {
    TokenService::new(config, Arc::new(HmacKeyProvider::from_secret(SECRET))).unwrap()
}

pub fn rsa_service() -> TokenService {
    TokenService::new(
        SecurityConfig::default().with_algorithm(JwtAlgorithm::RS256),
        Arc::new(RsaKeyProvider::from_pem(RSA_PRIVATE, RSA_PUBLIC).with_key_id("rsa-test")),
    )
    .unwrap()
}
