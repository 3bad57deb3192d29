//! HTTP Basic credential check.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::core::config::AuthConfig;

/// Why a request failed the credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthRejection {
    /// No (parseable) Basic credentials were supplied.
    #[error("Authentication required")]
    Missing,

    /// Credentials were supplied but do not match.
    #[error("Invalid credentials")]
    Invalid,
}

/// Decode `Basic <base64(user:pass)>` into its two halves.
fn decode_basic(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Check an `Authorization` header value against the configured credentials.
///
/// Passes unconditionally when auth is disabled. Username and password are
/// both compared before the result is combined.
pub fn verify_basic_auth(config: &AuthConfig, header: Option<&str>) -> Result<(), AuthRejection> {
    if !config.enabled {
        return Ok(());
    }

    let (username, password) = header.and_then(decode_basic).ok_or(AuthRejection::Missing)?;

    let username_ok = username.as_bytes().ct_eq(config.username.as_bytes());
    let password_ok = password.as_bytes().ct_eq(config.password.as_bytes());

    if bool::from(username_ok & password_ok) {
        Ok(())
    } else {
        Err(AuthRejection::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> AuthConfig {
        AuthConfig {
            enabled: true,
            username: "admin".to_string(),
            password: "s3cret".to_string(),
        }
    }

    fn basic(user: &str, pass: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
    }

    #[test]
    fn test_correct_credentials_pass() {
        assert_eq!(verify_basic_auth(&enabled(), Some(&basic("admin", "s3cret"))), Ok(()));
    }

    #[test]
    fn test_wrong_credentials_rejected() {
        let config = enabled();
        for (user, pass) in [("admin", "wrong"), ("root", "s3cret"), ("root", "wrong")] {
            assert_eq!(
                verify_basic_auth(&config, Some(&basic(user, pass))),
                Err(AuthRejection::Invalid),
                "{user}:{pass} should be rejected"
            );
        }
    }

    #[test]
    fn test_missing_or_malformed_header() {
        let config = enabled();
        assert_eq!(verify_basic_auth(&config, None), Err(AuthRejection::Missing));
        assert_eq!(
            verify_basic_auth(&config, Some("Bearer abc")),
            Err(AuthRejection::Missing)
        );
        assert_eq!(
            verify_basic_auth(&config, Some("Basic !!notbase64")),
            Err(AuthRejection::Missing)
        );
    }

    #[test]
    fn test_disabled_accepts_anything() {
        let config = AuthConfig::default();
        assert_eq!(verify_basic_auth(&config, None), Ok(()));
        assert_eq!(verify_basic_auth(&config, Some(&basic("x", "y"))), Ok(()));
    }

    #[test]
    fn test_password_may_contain_colon() {
        let mut config = enabled();
        config.password = "a:b".to_string();
        assert_eq!(verify_basic_auth(&config, Some(&basic("admin", "a:b"))), Ok(()));
    }
}
