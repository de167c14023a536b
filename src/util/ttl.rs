//! TTL strings: `"3600"`, `"90s"`, `"15m"`, `"12h"`, `"7d"`, `"2w"`.

use crate::error::AuthError;
use std::time::Duration;

/// Parse a TTL string into a duration.
///
/// A bare number is seconds. Zero, negative, fractional and overflowing
/// values are rejected.
///
/// # Errors
///
/// Returns a configuration error if the string is not a valid TTL.
pub fn parse_ttl(input: &str) -> Result<Duration, AuthError> {
    let trimmed = input.trim();
    let invalid = || AuthError::configuration(format!("Invalid TTL: {input:?}"));

    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    if digits.is_empty() {
        return Err(invalid());
    }

    let value: u64 = digits.parse().map_err(|_| invalid())?;
    let multiplier: u64 = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        "w" => 604_800,
        _ => return Err(invalid()),
    };

    let seconds = value.checked_mul(multiplier).ok_or_else(invalid)?;
    // exp is computed in i64 epoch seconds
    if seconds == 0 || seconds > i64::MAX as u64 / 2 {
        return Err(invalid());
    }
    Ok(Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_ttl("3600").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_ttl("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_ttl("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_ttl("12h").unwrap(), Duration::from_secs(43_200));
        assert_eq!(parse_ttl("7d").unwrap(), Duration::from_secs(604_800));
        assert_eq!(parse_ttl("2w").unwrap(), Duration::from_secs(1_209_600));
        assert_eq!(parse_ttl(" 1 ").unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "m", "0", "-5", "1.5h", "10y", "abc", "99999999999999999999"] {
            assert!(parse_ttl(input).is_err(), "{input:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(parse_ttl("18446744073709551615w").is_err());
    }
}
