//! Backend session cookies.
//!
//! The Veya API uses cookie sessions. On login it sets `sessionid` and
//! `csrftoken`; every authenticated call has to replay both, and unsafe
//! methods also need the token echoed in `X-CSRFToken`.

use serde::{Deserialize, Serialize};

const SESSION_COOKIE: &str = "sessionid";
const CSRF_COOKIE: &str = "csrftoken";

/// The cookie pair issued by the API on login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSession {
    pub session_id: String,
    pub csrf_token: Option<String>,
}

impl BackendSession {
    /// Extract the session from `Set-Cookie` header values.
    ///
    /// Returns `None` when no non-empty `sessionid` cookie was set.
    pub fn from_set_cookie<'a>(headers: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let mut session_id = None;
        let mut csrf_token = None;

        for header in headers {
            let Some((name, value)) = cookie_pair(header) else {
                continue;
            };
            match name {
                SESSION_COOKIE if !value.is_empty() => session_id = Some(value.to_string()),
                CSRF_COOKIE if !value.is_empty() => csrf_token = Some(value.to_string()),
                _ => {}
            }
        }

        session_id.map(|session_id| Self {
            session_id,
            csrf_token,
        })
    }

    /// Value for the `Cookie` request header.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        self.csrf_token.as_ref().map_or_else(
            || format!("{SESSION_COOKIE}={}", self.session_id),
            |csrf| format!("{SESSION_COOKIE}={}; {CSRF_COOKIE}={csrf}", self.session_id),
        )
    }
}

impl std::fmt::Debug for BackendSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSession")
            .field("session_id", &"[REDACTED]")
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Split the leading `name=value` of a `Set-Cookie` header.
fn cookie_pair(header: &str) -> Option<(&str, &str)> {
    let first = header.split(';').next()?;
    let (name, value) = first.split_once('=')?;
    Some((name.trim(), value.trim().trim_matches('"')))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_session_and_csrf_cookies() {
        let headers = [
            "csrftoken=Tk9x2; expires=Thu, 15 Oct 2027 10:00:00 GMT; Max-Age=31449600; Path=/; SameSite=Lax",
            "sessionid=abc123; expires=Thu, 29 Oct 2026 10:00:00 GMT; HttpOnly; Max-Age=1209600; Path=/; SameSite=Lax",
        ];
        let session = BackendSession::from_set_cookie(headers).unwrap();
        assert_eq!(session.session_id, "abc123");
        assert_eq!(session.csrf_token.as_deref(), Some("Tk9x2"));
        assert_eq!(session.cookie_header(), "sessionid=abc123; csrftoken=Tk9x2");
    }

    #[test]
    fn test_missing_session_cookie() {
        assert!(BackendSession::from_set_cookie(["csrftoken=Tk9x2; Path=/"]).is_none());
        assert!(BackendSession::from_set_cookie(["sessionid=; Max-Age=0; Path=/"]).is_none());
    }

    #[test]
    fn test_cookie_header_without_csrf() {
        let session = BackendSession {
            session_id: "abc123".to_string(),
            csrf_token: None,
        };
        assert_eq!(session.cookie_header(), "sessionid=abc123");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let session = BackendSession {
            session_id: "abc123".to_string(),
            csrf_token: Some("Tk9x2".to_string()),
        };
        let debug = format!("{session:?}");
        assert!(!debug.contains("abc123"));
        assert!(!debug.contains("Tk9x2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
