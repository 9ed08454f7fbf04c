//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use veya_core::UserId;

use crate::api::{BackendSession, User};

/// Session-stored user identity.
///
/// Holds just enough to greet the customer and replay the backend session on
/// authenticated API calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's backend ID.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Email address as the backend reported it (may be empty).
    pub email: String,
    /// First name, used for the greeting.
    pub first_name: String,
    /// Last name, used to pre-fill checkout.
    #[serde(default)]
    pub last_name: String,
    /// Backend session cookies.
    pub backend: BackendSession,
}

impl CurrentUser {
    /// Build the session identity from a login or registration response.
    #[must_use]
    pub fn new(user: &User, backend: BackendSession) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            backend,
        }
    }

    /// Refresh the cached profile fields after a profile update.
    pub fn update_profile(&mut self, user: &User) {
        self.email.clone_from(&user.email);
        self.first_name.clone_from(&user.first_name);
        self.last_name.clone_from(&user.last_name);
    }

    /// "First Last", skipping empty parts.
    #[must_use]
    pub fn full_name(&self) -> String {
        [self.first_name.trim(), self.last_name.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// First name when set, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.first_name.trim().is_empty() {
            &self.username
        } else {
            &self.first_name
        }
    }
}

/// Session keys for storefront state.
pub mod session_keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the promo countdown deadline (RFC 3339 timestamp).
    pub const PROMO_DEADLINE: &str = "promo_deadline";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(first_name: &str) -> User {
        User {
            id: UserId::new(7),
            username: "ananya_k".to_string(),
            email: "ananya@example.com".to_string(),
            first_name: first_name.to_string(),
            last_name: "K".to_string(),
            date_joined: None,
        }
    }

    fn backend() -> BackendSession {
        BackendSession {
            session_id: "abc123".to_string(),
            csrf_token: None,
        }
    }

    #[test]
    fn test_display_name_prefers_first_name() {
        assert_eq!(CurrentUser::new(&user(""), backend()).display_name(), "ananya_k");
        assert_eq!(CurrentUser::new(&user("Ananya"), backend()).display_name(), "Ananya");
    }

    #[test]
    fn test_update_profile_keeps_backend_session() {
        let mut current = CurrentUser::new(&user(""), backend());
        let mut updated = user("Ananya");
        updated.email = "a.k@example.com".to_string();
        current.update_profile(&updated);
        assert_eq!(current.email, "a.k@example.com");
        assert_eq!(current.display_name(), "Ananya");
        assert_eq!(current.backend.session_id, "abc123");
    }

    #[test]
    fn test_full_name_skips_blanks() {
        assert_eq!(CurrentUser::new(&user("Ananya"), backend()).full_name(), "Ananya K");
        let mut nameless = user("");
        nameless.last_name = String::new();
        assert_eq!(CurrentUser::new(&nameless, backend()).full_name(), "");
    }

    #[test]
    fn test_session_roundtrip() {
        let current = CurrentUser::new(&user("Ananya"), backend());
        let json = serde_json::to_value(&current).unwrap();
        let restored: CurrentUser = serde_json::from_value(json).unwrap();
        assert_eq!(restored.backend, current.backend);
        assert_eq!(restored.id, current.id);
    }
}
