//! Security configuration.
//!
//! Loaded once at process start from environment variables and treated as
//! read-only afterwards. Key material locations live in [`KeyConfig`] and are
//! handed to the key provider, which becomes their only owner.

use crate::error::AuthError;
use crate::jwt::TokenKind;
use crate::keys::KeySource;
use crate::util::parse_ttl;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Fixed development secret used when no HMAC secret is configured outside
/// production.
pub const DEVELOPMENT_SECRET: &str = "messenger-auth-development-secret-do-not-use-in-production";

/// JWT signing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JwtAlgorithm {
    /// HMAC with SHA-256
    HS256,
    /// RSA PKCS#1 v1.5 with SHA-256
    RS256,
}

impl JwtAlgorithm {
    /// Get algorithm name for JWT header.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::RS256 => "RS256",
        }
    }

    /// The `jsonwebtoken` algorithm.
    #[must_use]
    pub const fn to_jwt(self) -> jsonwebtoken::Algorithm {
        match self {
            Self::HS256 => jsonwebtoken::Algorithm::HS256,
            Self::RS256 => jsonwebtoken::Algorithm::RS256,
        }
    }
}

impl FromStr for JwtAlgorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HS256" => Ok(Self::HS256),
            "RS256" => Ok(Self::RS256),
            _ => Err(AuthError::unsupported_algorithm(s)),
        }
    }
}

impl fmt::Display for JwtAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local or test deployments
    #[default]
    Development,
    /// Production: no development fallbacks
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    /// Whether this is a production deployment.
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Token lifetimes, algorithm and enforcement flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    /// Signing and verification algorithm
    pub algorithm: JwtAlgorithm,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
    /// Tolerance applied to `exp` and `iat` checks
    pub clock_skew: Duration,
    /// Expected `iss`, embedded and enforced when set
    pub issuer: Option<String>,
    /// Require the device guard to compare device ids
    pub enable_device_binding: bool,
    /// Boundary layer must consult the revocation store after `verify`
    pub enable_revocation_check: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            algorithm: JwtAlgorithm::HS256,
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(7 * 86_400),
            clock_skew: Duration::from_secs(60),
            issuer: None,
            enable_device_binding: false,
            enable_revocation_check: false,
        }
    }
}

impl SecurityConfig {
    /// Set the algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: JwtAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the access token lifetime.
    #[must_use]
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    /// Set the refresh token lifetime.
    #[must_use]
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    /// Set the clock-skew tolerance.
    #[must_use]
    pub fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = skew;
        self
    }

    /// Set the expected issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Enable or disable device binding.
    #[must_use]
    pub fn with_device_binding(mut self, enabled: bool) -> Self {
        self.enable_device_binding = enabled;
        self
    }

    /// Enable or disable the revocation check flag.
    #[must_use]
    pub fn with_revocation_check(mut self, enabled: bool) -> Self {
        self.enable_revocation_check = enabled;
        self
    }

    /// Lifetime for tokens of the given kind.
    #[must_use]
    pub const fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_token_ttl,
            TokenKind::Refresh => self.refresh_token_ttl,
        }
    }
}

/// Where key material comes from.
#[derive(Debug, Clone, Default)]
pub struct KeyConfig {
    /// Key id embedded as `kid` in token headers
    pub key_id: Option<String>,
    /// HMAC secret source
    pub hmac_secret: KeySource,
    /// RSA private key (PEM) source
    pub rsa_private_key: KeySource,
    /// RSA public key (PEM) source
    pub rsa_public_key: KeySource,
    /// Fall back to [`DEVELOPMENT_SECRET`] when no HMAC secret resolves
    pub development_fallback: bool,
}

/// Complete configuration consumed at startup.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Deployment environment
    pub environment: Environment,
    /// Token settings
    pub security: SecurityConfig,
    /// Key material locations
    pub keys: KeyConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let environment = get("APP_ENV")
            .map(|v| Environment::parse(&v))
            .unwrap_or_default();

        let algorithm = match get("JWT_ALGORITHM") {
            Some(v) => v.parse()?,
            None => JwtAlgorithm::HS256,
        };
        let access_token_ttl = parse_ttl(&get("JWT_ACCESS_TTL").unwrap_or_else(|| "15m".into()))?;
        let refresh_token_ttl = parse_ttl(&get("JWT_REFRESH_TTL").unwrap_or_else(|| "7d".into()))?;
        let clock_skew = match get("JWT_CLOCK_SKEW") {
            Some(v) => Duration::from_secs(parse_value("JWT_CLOCK_SKEW", &v)?),
            None => Duration::from_secs(60),
        };

        let security = SecurityConfig {
            algorithm,
            access_token_ttl,
            refresh_token_ttl,
            clock_skew,
            issuer: get("JWT_ISSUER"),
            enable_device_binding: parse_flag(&get, "ENABLE_DEVICE_BINDING")?,
            enable_revocation_check: parse_flag(&get, "ENABLE_REDIS_BLACKLIST")?,
        };

        let keys = KeyConfig {
            key_id: get("JWT_KEY_ID"),
            hmac_secret: source_from(&get, "JWT_SECRET_ENV", "JWT_SECRET", "JWT_SECRET_FILE"),
            rsa_private_key: source_from(
                &get,
                "JWT_PRIVATE_KEY_ENV",
                "JWT_PRIVATE_KEY",
                "JWT_PRIVATE_KEY_PATH",
            ),
            rsa_public_key: source_from(
                &get,
                "JWT_PUBLIC_KEY_ENV",
                "JWT_PUBLIC_KEY",
                "JWT_PUBLIC_KEY_PATH",
            ),
            development_fallback: !environment.is_production(),
        };

        Ok(Self {
            environment,
            security,
            keys,
        })
    }
}

/// Build a key source from an env-var-name override and a file path variable.
fn source_from<G>(get: &G, name_var: &str, default_name: &str, file_var: &str) -> KeySource
where
    G: Fn(&str) -> Option<String>,
{
    let env_name = get(name_var).unwrap_or_else(|| default_name.to_string());
    let source = KeySource::default().with_env(env_name);
    match get(file_var) {
        Some(path) => source.with_file(path),
        None => source,
    }
}

/// Parse a value with a descriptive configuration error.
fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T, AuthError>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AuthError::configuration(format!("Invalid {name}: {e}")))
}

/// Parse a boolean flag, defaulting to `false` when unset.
fn parse_flag<G>(get: &G, name: &str) -> Result<bool, AuthError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(name).map(|v| v.trim().to_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(AuthError::configuration(format!("Invalid {name}: {v}"))),
        },
    }
}
