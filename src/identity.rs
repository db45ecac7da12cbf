use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub avatar_name: String,
    pub join_date: DateTime<Utc>,
}

/// Mocked identity: guest by default, "authenticated" by a delayed login.
/// Nothing here checks credentials.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Identity {
    is_authenticated: bool,
    is_guest: bool,
    user: Option<UserRecord>,
    last_logged_in_email: Option<String>,
    has_login_history: bool,
}

impl Identity {
    pub fn guest() -> Self {
        Identity {
            is_guest: true,
            ..Default::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn is_guest(&self) -> bool {
        self.is_guest
    }

    pub fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    pub fn last_logged_in_email(&self) -> Option<&str> {
        self.last_logged_in_email.as_deref()
    }

    pub fn has_login_history(&self) -> bool {
        self.has_login_history
    }

    pub fn display_name(&self) -> &str {
        if self.is_guest {
            "Guest"
        } else {
            self.user.as_ref().map(|u| u.username.as_str()).unwrap_or("User")
        }
    }

    pub fn continue_as_guest(&mut self) {
        self.is_guest = true;
        self.is_authenticated = false;
    }

    /// Completes a login or signup. Without an explicit username the local
    /// part of the email is used.
    pub fn complete_login(&mut self, email: &str, username: Option<&str>, now: DateTime<Utc>) {
        let username = username
            .map(str::to_string)
            .unwrap_or_else(|| username_from_email(email));

        self.is_authenticated = true;
        self.is_guest = false;
        self.user = Some(UserRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            username,
            avatar_name: "maple_avatar_1".to_string(),
            join_date: now,
        });
        self.last_logged_in_email = Some(email.to_string());
        self.has_login_history = true;
    }

    /// Drops the user but leaves guest mode as it was.
    pub fn logout(&mut self) {
        self.is_authenticated = false;
        self.user = None;
    }
}

fn username_from_email(email: &str) -> String {
    match email.split('@').next() {
        Some(local) if !local.is_empty() => local.to_string(),
        _ => "User".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_display_name() {
        let identity = Identity::guest();
        assert!(identity.is_guest());
        assert!(!identity.is_authenticated());
        assert_eq!(identity.display_name(), "Guest");
    }

    #[test]
    fn test_login_derives_username() {
        let mut identity = Identity::guest();
        identity.complete_login("sam@example.com", None, Utc::now());
        assert_eq!(identity.display_name(), "sam");
        assert!(identity.is_authenticated());
        assert_eq!(identity.last_logged_in_email(), Some("sam@example.com"));
        assert!(identity.has_login_history());
    }

    #[test]
    fn test_signup_uses_username() {
        let mut identity = Identity::guest();
        identity.complete_login("sam@example.com", Some("samwise"), Utc::now());
        assert_eq!(identity.display_name(), "samwise");
    }

    #[test]
    fn test_logout_keeps_history() {
        let mut identity = Identity::guest();
        identity.complete_login("sam@example.com", None, Utc::now());
        identity.logout();
        assert!(!identity.is_authenticated());
        assert!(identity.user().is_none());
        assert!(!identity.is_guest());
        assert_eq!(identity.display_name(), "User");
        assert!(identity.has_login_history());
    }

    #[test]
    fn test_username_fallback() {
        assert_eq!(username_from_email("@nowhere"), "User");
        assert_eq!(username_from_email("plain"), "plain");
    }
}
