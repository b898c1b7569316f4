use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Identity model - a registered principal
///
/// The email is stored normalized and is the uniqueness key. Identities are
/// immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Build a new identity with a fresh ID; `email` must already be normalized
    pub fn new(email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Projection safe to return to callers
    pub fn to_public(&self) -> PublicIdentity {
        PublicIdentity {
            id: self.id,
            email: self.email.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Public identity fields (never includes the password hash)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicIdentity {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Identity> for PublicIdentity {
    fn from(identity: &Identity) -> Self {
        identity.to_public()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_omits_password_hash() {
        let identity = Identity::new("a@b.com".to_string(), "$argon2id$secret".to_string());

        let json = serde_json::to_string(&identity).expect("serialize identity");
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("$argon2id$secret"));

        let public = serde_json::to_value(identity.to_public()).expect("serialize public");
        assert_eq!(public["email"], "a@b.com");
    }
}
