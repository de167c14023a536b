//! Authentication-token core for the messaging backend.
//!
//! Provides key providers (HMAC and RSA), a token service that signs,
//! verifies and rotates session tokens, claim guards for authorization
//! checks, and the error taxonomy used to report failures.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod guards;
#[allow(missing_docs)]
pub mod jwt;
pub mod keys;
pub mod observability;
pub mod refresh;
pub mod revocation;
pub mod service;
pub mod util;

// Re-exports for convenience
pub use config::{Config, JwtAlgorithm, SecurityConfig};
pub use error::{AuthError, AuthErrorKind, ErrorCode};
pub use jwt::{Claims, IssueClaims, TokenKind};
pub use refresh::RotatedTokens;
pub use service::TokenService;
