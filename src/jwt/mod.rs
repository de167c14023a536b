pub mod claims;
pub mod serializer;

pub use claims::{Claims, IssueClaims, TokenKind};
pub use serializer::JwtSerializer;

use crate::error::AuthError;

/// Extract the raw token from an `Authorization` header value.
///
/// Absent or blank headers are `missing_token`; anything but a
/// `Bearer <token>` pair is `malformed`.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let value = match header.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return Err(AuthError::missing_token()),
    };

    let (scheme, token) = value.split_once(char::is_whitespace).unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::malformed(format!("unsupported scheme {scheme}")));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::missing_token());
    }
    if token.split('.').count() != 3 || token.contains(char::is_whitespace) {
        return Err(AuthError::malformed("token is not a compact JWT"));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(Some("Bearer a.b.c")).unwrap(), "a.b.c");
        assert_eq!(extract_bearer(Some("bearer   a.b.c ")).unwrap(), "a.b.c");
    }

    #[test]
    fn test_extract_bearer_missing() {
        for header in [None, Some(""), Some("   "), Some("Bearer ")] {
            let err = extract_bearer(header).unwrap_err();
            assert_eq!(err.code(), ErrorCode::MissingToken, "{header:?}");
        }
    }

    #[test]
    fn test_extract_bearer_malformed() {
        for header in ["Basic dXNlcjpwYXNz", "a.b.c", "Bearer abc", "Bearer a.b.c d"] {
            let err = extract_bearer(Some(header)).unwrap_err();
            assert_eq!(err.code(), ErrorCode::Malformed, "{header}");
        }
    }
}
