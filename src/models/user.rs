use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A registered account.
///
/// `password_hash` and `refresh_token_hash` never leave the server: they are skipped
/// when the record is serialized into a response.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Lower-cased and trimmed, unique across all users.
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// SHA-256 digest of the most recently issued refresh token.
    #[serde(skip_serializing, default)]
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public projection used when a user is embedded in another resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Fields the store needs to create a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial update applied by the store; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

/// Body of `POST /api/users`.
#[derive(Debug, Deserialize, Validate)]
pub struct UserInput {
    #[validate(custom = "crate::models::validate_name")]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Body of `PUT /api/users/{id}`. At least one field must be present.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UserUpdateInput {
    #[validate(custom = "crate::models::validate_name")]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
}

impl UserUpdateInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none()
    }
}

/// Canonical form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_user_input_validation() {
        let input = UserInput {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(input.validate().is_ok());

        let input = UserInput {
            name: "A".to_string(),
            email: "ada@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(input.validate().is_err());

        let input = UserInput {
            name: "Ada".to_string(),
            email: "invalid-email".to_string(),
            password: "password123".to_string(),
        };
        assert!(input.validate().is_err());

        let input = UserInput {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_update_input_checks_only_present_fields() {
        let empty = UserUpdateInput::default();
        assert!(empty.is_empty());
        assert!(empty.validate().is_ok());

        let rename = UserUpdateInput {
            name: Some("Grace".to_string()),
            ..Default::default()
        };
        assert!(!rename.is_empty());
        assert!(rename.validate().is_ok());

        let bad_password = UserUpdateInput {
            password: Some("123".to_string()),
            ..Default::default()
        };
        assert!(bad_password.validate().is_err());
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$2b$10$hash".to_string(),
            refresh_token_hash: Some("digest".to_string()),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("refreshTokenHash").is_none());
        assert_eq!(json["email"], "ada@example.com");
        assert!(json["createdAt"].is_string());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }
}
