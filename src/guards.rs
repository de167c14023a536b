//! Claim guards.
//!
//! Each guard checks one authorization rule against a verified claim-set
//! and returns the same claim-set on success, so guards chain with
//! `and_then`; the first failure short-circuits. Missing data never passes.
//! The required values are kept as the internal cause, so they reach logs
//! but never the client-facing problem object.
//!
//! ```
//! use messenger_auth::guards::{assert_role, assert_token_type, assert_vip};
//! use messenger_auth::jwt::{Claims, TokenKind};
//!
//! fn admin_vip_only(claims: &Claims) -> Result<&Claims, messenger_auth::AuthError> {
//!     assert_token_type(claims, TokenKind::Access)
//!         .and_then(|c| assert_role(c, &["admin"]))
//!         .and_then(assert_vip)
//! }
//! ```

use crate::error::AuthError;
use crate::jwt::{Claims, TokenKind};
use subtle::ConstantTimeEq;

/// Pass if the role is one of `allowed`.
pub fn assert_role<'a, S: AsRef<str>>(
    claims: &'a Claims,
    allowed: &[S],
) -> Result<&'a Claims, AuthError> {
    let permitted = claims
        .role_id
        .as_deref()
        .is_some_and(|role| allowed.iter().any(|a| a.as_ref() == role));
    if permitted {
        Ok(claims)
    } else {
        Err(AuthError::forbidden("role not permitted")
            .with_cause(format!("required one of roles {:?}", names(allowed))))
    }
}

/// Pass if the claim-set holds at least one of `required`.
///
/// An empty requirement list denies: an unconfigured rule is not an open door.
pub fn assert_scopes<'a, S: AsRef<str>>(
    claims: &'a Claims,
    required: &[S],
) -> Result<&'a Claims, AuthError> {
    let permitted = required.iter().any(|r| claims.has_scope(r.as_ref()));
    if permitted {
        Ok(claims)
    } else {
        Err(AuthError::forbidden("insufficient scope")
            .with_cause(format!("required one of scopes {:?}", names(required))))
    }
}

/// Pass if the team id is present and one of `allowed`.
pub fn assert_team<'a, S: AsRef<str>>(
    claims: &'a Claims,
    allowed: &[S],
) -> Result<&'a Claims, AuthError> {
    match claims.team_id.as_deref() {
        Some(team) if allowed.iter().any(|a| a.as_ref() == team) => Ok(claims),
        Some(_) => Err(AuthError::forbidden("team not permitted")),
        None => Err(AuthError::forbidden("team membership required")),
    }
}

/// Pass if device binding is disabled, or the bound device equals
/// `current_device_id`.
pub fn assert_device<'a>(
    claims: &'a Claims,
    current_device_id: &str,
    binding_enabled: bool,
) -> Result<&'a Claims, AuthError> {
    if !binding_enabled {
        return Ok(claims);
    }
    match claims.device_id.as_deref() {
        Some(bound)
            if !current_device_id.is_empty()
                && bool::from(bound.as_bytes().ct_eq(current_device_id.as_bytes())) =>
        {
            Ok(claims)
        }
        _ => Err(AuthError::device_mismatch()),
    }
}

/// Pass if the token was signed for `kind`.
pub fn assert_token_type(claims: &Claims, kind: TokenKind) -> Result<&Claims, AuthError> {
    if claims.token_type == kind {
        Ok(claims)
    } else {
        Err(AuthError::forbidden(format!("{kind} token required")))
    }
}

/// Pass if the subject is VIP.
pub fn assert_vip(claims: &Claims) -> Result<&Claims, AuthError> {
    if claims.vip {
        Ok(claims)
    } else {
        Err(AuthError::forbidden("vip membership required"))
    }
}

fn names<S: AsRef<str>>(values: &[S]) -> Vec<&str> {
    values.iter().map(AsRef::as_ref).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn claims() -> Claims {
        Claims {
            sub: "u1".to_string(),
            iat: 0,
            exp: 60,
            jti: "j1".to_string(),
            iss: None,
            role_id: Some("member".to_string()),
            team_id: None,
            vip: false,
            scope: Some(vec!["read".to_string()]),
            device_id: Some("d1".to_string()),
            token_type: TokenKind::Access,
        }
    }

    #[test]
    fn test_role() {
        let c = claims();
        let err = assert_role(&c, &["admin"]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);
        assert_eq!(err.status().as_u16(), 403);
        assert_eq!(assert_role(&c, &["member", "admin"]).unwrap(), &c);

        let mut no_role = claims();
        no_role.role_id = None;
        assert!(assert_role(&no_role, &["member"]).is_err());
    }

    #[test]
    fn test_requirements_stay_out_of_problem() {
        let c = claims();
        for err in [
            assert_role(&c, &["admin", "moderator"]).unwrap_err(),
            assert_scopes(&c, &["admin:write"]).unwrap_err(),
        ] {
            let problem = serde_json::to_string(&err.to_problem()).unwrap();
            assert!(!problem.contains("admin"), "{problem}");
            assert!(err.details().is_none());

            let record = err.to_log_record();
            assert!(record.causes.iter().any(|c| c.contains("admin")));
        }
    }

    #[test]
    fn test_scopes_union_match() {
        let c = claims();
        assert!(assert_scopes(&c, &["read", "write"]).is_ok());
        assert!(assert_scopes(&c, &["write"]).is_err());
        assert!(assert_scopes(&c, &[] as &[&str]).is_err());

        let mut empty = claims();
        empty.scope = Some(Vec::new());
        assert!(assert_scopes(&empty, &["read"]).is_err());
        empty.scope = None;
        assert!(assert_scopes(&empty, &["read"]).is_err());
    }

    #[test]
    fn test_team() {
        let mut c = claims();
        assert!(assert_team(&c, &["t1"]).is_err());
        assert!(assert_team(&c, &[] as &[&str]).is_err());

        c.team_id = Some("t1".to_string());
        assert!(assert_team(&c, &["t1", "t2"]).is_ok());
        assert!(assert_team(&c, &["t2"]).is_err());
    }

    #[test]
    fn test_device() {
        let c = claims();
        assert!(assert_device(&c, "d1", true).is_ok());
        let err = assert_device(&c, "d2", true).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DeviceMismatch);
        assert!(assert_device(&c, "d1", false).is_ok());
        assert!(assert_device(&c, "d2", false).is_ok());

        let mut unbound = claims();
        unbound.device_id = None;
        assert!(assert_device(&unbound, "d1", true).is_err());
        assert!(assert_device(&unbound, "", true).is_err());
        assert!(assert_device(&unbound, "", false).is_ok());
    }

    #[test]
    fn test_token_type() {
        let c = claims();
        assert!(assert_token_type(&c, TokenKind::Access).is_ok());
        let err = assert_token_type(&c, TokenKind::Refresh).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[test]
    fn test_vip() {
        let mut c = claims();
        assert!(assert_vip(&c).is_err());
        c.vip = true;
        assert!(assert_vip(&c).is_ok());
    }

    #[test]
    fn test_chain_short_circuits() {
        let c = claims();
        let err = assert_token_type(&c, TokenKind::Access)
            .and_then(|c| assert_role(c, &["member"]))
            .and_then(assert_vip)
            .and_then(|c| assert_device(c, "d2", true))
            .unwrap_err();
        // vip fails before the device check runs
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}
