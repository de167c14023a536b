//! Token service: signing and verification.
//!
//! Holds no mutable state of its own. Every call depends only on the key
//! provider, the configuration and the clock, so concurrent calls never
//! interfere.

use crate::config::{Config, SecurityConfig};
use crate::error::AuthError;
use crate::jwt::{Claims, IssueClaims, JwtSerializer, TokenKind};
use crate::keys::{provider_from_config, KeyProvider};
use crate::util::{generate_jti, Clock, SystemClock};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Signs, verifies and rotates session tokens.
#[derive(Clone)]
pub struct TokenService {
    config: SecurityConfig,
    keys: Arc<dyn KeyProvider>,
    serializer: JwtSerializer,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Create a service from a configuration and a key provider.
    ///
    /// # Errors
    ///
    /// Returns `unsupported_algorithm` if the provider cannot serve the
    /// configured algorithm.
    pub fn new(config: SecurityConfig, keys: Arc<dyn KeyProvider>) -> Result<Self, AuthError> {
        if keys.algorithm() != config.algorithm {
            return Err(AuthError::unsupported_algorithm(config.algorithm.as_str())
                .with_cause(format!(
                    "key provider serves {}, configuration requests {}",
                    keys.algorithm(),
                    config.algorithm
                )));
        }

        Ok(Self {
            serializer: JwtSerializer::new(config.algorithm),
            config,
            keys,
            clock: Arc::new(SystemClock),
        })
    }

    /// Create a service and its key provider from startup configuration.
    ///
    /// # Errors
    ///
    /// See [`TokenService::new`].
    pub fn from_config(config: Config) -> Result<Self, AuthError> {
        let security = config.security.clone();
        let keys = provider_from_config(config);
        Self::new(security, keys)
    }

    /// Replace the clock used for `iat`, `exp` and expiry checks.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The security configuration.
    #[must_use]
    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// Whether the device guard should compare device ids.
    #[must_use]
    pub fn device_binding_enabled(&self) -> bool {
        self.config.enable_device_binding
    }

    /// Whether callers must consult the revocation store after `verify`.
    #[must_use]
    pub fn revocation_check_enabled(&self) -> bool {
        self.config.enable_revocation_check
    }

    /// Sign a token of the given kind.
    ///
    /// Sets `iat` to now, `exp` to now plus the kind's TTL, `tokenType` to
    /// `kind`, and generates a `jti` unless one is supplied.
    ///
    /// # Errors
    ///
    /// Returns `validation_error` for an empty subject, or a key error if
    /// the signing key cannot be resolved.
    #[instrument(skip(self, claims), fields(sub = %claims.sub))]
    pub async fn sign(&self, kind: TokenKind, claims: IssueClaims) -> Result<String, AuthError> {
        let claims = self.build_claims(kind, claims)?;
        let key = self.keys.active_key().await?;
        let token = self
            .serializer
            .serialize(&claims, key, self.keys.key_id())?;

        debug!(jti = %claims.jti, exp = claims.exp, "Signed {kind} token");
        Ok(token)
    }

    fn build_claims(&self, kind: TokenKind, input: IssueClaims) -> Result<Claims, AuthError> {
        if input.sub.trim().is_empty() {
            return Err(AuthError::field("sub", "subject is required"));
        }
        if input.jti.as_deref().is_some_and(|j| j.trim().is_empty()) {
            return Err(AuthError::field("jti", "token id must not be empty"));
        }

        let iat = self.clock.now();
        let ttl = i64::try_from(self.config.ttl(kind).as_secs())
            .map_err(|_| AuthError::configuration(format!("{kind} TTL out of range")))?;

        Ok(Claims {
            sub: input.sub,
            iat,
            exp: iat.saturating_add(ttl),
            jti: input.jti.unwrap_or_else(generate_jti),
            iss: self.config.issuer.clone(),
            role_id: input.role_id,
            team_id: input.team_id,
            vip: input.vip,
            scope: input.scope,
            device_id: input.device_id,
            token_type: kind,
        })
    }

    /// Verify a token and recover its claim-set.
    ///
    /// Only the configured algorithm is accepted. `exp` and `iat` are checked
    /// against the clock with the configured skew tolerance.
    ///
    /// # Errors
    ///
    /// Returns `expired` when the only problem is expiration, and `invalid`
    /// for every other verification failure.
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let key = self.keys.verify_key().await?;
        let claims = self.serializer.deserialize(token, key).inspect_err(|e| {
            warn!(code = %e.code(), "Rejected token");
        })?;

        self.check_claims(&claims)?;
        debug!(sub = %claims.sub, jti = %claims.jti, "Verified {} token", claims.token_type);
        Ok(claims)
    }

    fn check_claims(&self, claims: &Claims) -> Result<(), AuthError> {
        let now = self.clock.now();
        let leeway = i64::try_from(self.config.clock_skew.as_secs()).unwrap_or(i64::MAX);

        if claims.sub.trim().is_empty() || claims.jti.trim().is_empty() {
            return Err(AuthError::invalid(ClaimError("missing sub or jti")));
        }
        if claims.iat > now.saturating_add(leeway) {
            return Err(AuthError::invalid(ClaimError("issued in the future")));
        }
        if let Some(expected) = &self.config.issuer {
            if claims.iss.as_ref() != Some(expected) {
                return Err(AuthError::invalid(ClaimError("issuer mismatch")));
            }
        }
        if now > claims.exp.saturating_add(leeway) {
            debug!(jti = %claims.jti, exp = claims.exp, "Token expired");
            return Err(AuthError::expired(claims.exp));
        }
        Ok(())
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("config", &self.config)
            .field("algorithm", &self.keys.algorithm())
            .field("key_id", &self.keys.key_id())
            .finish_non_exhaustive()
    }
}

/// Claim-level verification failure kept as an internal cause.
#[derive(Debug)]
struct ClaimError(&'static str);

impl fmt::Display for ClaimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for ClaimError {}
