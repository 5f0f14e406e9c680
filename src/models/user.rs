use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Argon2 hash, never sent to clients
    #[serde(skip)]
    pub password: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Identity extracted from a verified bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_is_not_serialized() {
        let user = User {
            id: 1,
            name: "John".to_string(),
            password: "$argon2id$secret".to_string(),
            created: Utc::now(),
            updated: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["name"], "John");
        assert!(json.get("password").is_none());
    }
}
