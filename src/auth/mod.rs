use crate::models::UserId;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing credentials")]
    Missing,
    #[error("{0} is not registered")]
    NotRegistered(String),
}

/// Turns a request credential into the identity every store call is scoped to.
pub trait IdentityGate {
    fn identify(&self, credential: &str) -> Result<UserId, AuthError>;
}

/// Admits only pre-registered emails. There is no self sign-up: an unknown
/// email is denied, never provisioned.
#[derive(Clone, Debug, Default)]
pub struct Whitelist {
    users: BTreeMap<String, UserId>,
}

impl Whitelist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, email: &str, user_id: impl Into<UserId>) {
        self.users.insert(normalize_email(email), user_id.into());
    }

    pub fn is_registered(&self, email: &str) -> bool {
        self.users.contains_key(&normalize_email(email))
    }
}

impl IdentityGate for Whitelist {
    fn identify(&self, credential: &str) -> Result<UserId, AuthError> {
        let email = normalize_email(credential);
        if email.is_empty() {
            return Err(AuthError::Missing);
        }
        self.users
            .get(&email)
            .cloned()
            .ok_or(AuthError::NotRegistered(email))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitelist_admits_registered_only() {
        let mut wl = Whitelist::new();
        wl.register("Ada@Example.com", "u1");

        assert_eq!(wl.identify(" ada@example.com "), Ok("u1".to_string()));
        assert_eq!(
            wl.identify("mallory@example.com"),
            Err(AuthError::NotRegistered("mallory@example.com".to_string()))
        );
        assert_eq!(wl.identify("  "), Err(AuthError::Missing));
        assert!(wl.is_registered("ADA@example.com"));
    }
}
