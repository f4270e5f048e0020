//! Users registered by redeeming an invitation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Identity supplied at redemption. Also the body of a redeem request.
///
/// Uniqueness against existing users is not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct Identity {
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 255, message = "Email too long"))]
    pub email: String,

    #[validate(regex(
        path = *shared::validation::USERNAME_REGEX,
        message = "Username must be 3-32 letters, digits, '.', '_' or '-'"
    ))]
    pub username: String,
}

impl Identity {
    pub fn new(email: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
        }
    }

    /// Trims surrounding whitespace from both fields.
    pub fn normalized(self) -> Self {
        Self {
            email: self.email.trim().to_string(),
            username: self.username.trim().to_string(),
        }
    }
}

/// A user created exactly once, at redemption. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub id: Uuid,
    #[serde(flatten)]
    pub identity: Identity,
    pub created_at: DateTime<Utc>,
    /// The invitation this user redeemed. A relation only: the invitation
    /// may later be deleted.
    pub invitation_id: Uuid,
}

impl User {
    pub fn new(identity: Identity, invitation_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            created_at: now,
            invitation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_validation() {
        assert!(Identity::new("alice@example.com", "alice").validate().is_ok());
        assert!(Identity::new("not-an-email", "alice").validate().is_err());
        assert!(Identity::new("alice@example.com", "a").validate().is_err());
        assert!(Identity::new("alice@example.com", "bad name").validate().is_err());
    }

    #[test]
    fn test_identity_normalized() {
        let identity = Identity::new("  alice@example.com ", "\talice\n").normalized();
        assert_eq!(identity, Identity::new("alice@example.com", "alice"));
    }

    #[test]
    fn test_user_serializes_identity_flat() {
        let user = User::new(
            Identity::new("bob@example.com", "bob"),
            Uuid::nil(),
            Utc::now(),
        );
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "bob@example.com");
        assert_eq!(json["username"], "bob");
        assert_eq!(json["invitation_id"], Uuid::nil().to_string());

        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
    }
}
