use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of token a claim-set was signed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived token presented on ordinary requests
    Access,
    /// Long-lived token accepted only by the refresh endpoint
    Refresh,
}

impl TokenKind {
    /// Wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verified token payload.
///
/// Only produced by signing or verification; guards read it and never
/// change it. Transformations build a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    // Standard JWT claims
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    // Messaging claims
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default)]
    pub vip: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub token_type: TokenKind,
}

impl Claims {
    /// Checks if the claim-set carries a scope
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope
            .as_ref()
            .is_some_and(|scopes| scopes.iter().any(|s| s == scope))
    }
}

/// Caller-supplied claims for a token about to be signed.
///
/// `iat`, `exp` and `tokenType` are always set by the signer. `jti` is
/// generated unless carried over explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueClaims {
    pub sub: String,
    pub role_id: Option<String>,
    pub team_id: Option<String>,
    pub vip: bool,
    pub scope: Option<Vec<String>>,
    pub device_id: Option<String>,
    pub jti: Option<String>,
}

impl IssueClaims {
    pub fn new(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            ..Self::default()
        }
    }

    pub fn role(mut self, role_id: impl Into<String>) -> Self {
        self.role_id = Some(role_id.into());
        self
    }

    pub fn team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    pub fn vip(mut self, vip: bool) -> Self {
        self.vip = vip;
        self
    }

    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    pub fn device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Carry over an existing token identifier.
    pub fn jti(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }

    /// Drop any carried-over identifier so a fresh one is generated.
    pub fn with_fresh_jti(mut self) -> Self {
        self.jti = None;
        self
    }
}

impl From<Claims> for IssueClaims {
    /// Keeps the subject facts and the token identifier.
    fn from(claims: Claims) -> Self {
        Self {
            sub: claims.sub,
            role_id: claims.role_id,
            team_id: claims.team_id,
            vip: claims.vip,
            scope: claims.scope,
            device_id: claims.device_id,
            jti: Some(claims.jti),
        }
    }
}
