use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An email address owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Email {
    pub id: i64,
    pub user_id: i64,
    pub address: String,
    pub created: DateTime<Utc>,
}

/// Normalize and validate a bare `local@domain` address.
///
/// Returns the trimmed address, or `None` when it cannot be an address.
pub fn parse_address(raw: &str) -> Option<String> {
    let address = raw.trim();
    if address.is_empty() || address.len() > 254 {
        return None;
    }
    if address.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return None;
    }

    let (local, domain) = address.rsplit_once('@')?;
    if local.is_empty() || local.len() > 64 || local.contains('@') {
        return None;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return None;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return None;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    if !labels_ok {
        return None;
    }

    Some(address.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        assert_eq!(parse_address("john@example.com").as_deref(), Some("john@example.com"));
        assert_eq!(parse_address("  a.b+c@mail.example.org ").as_deref(), Some("a.b+c@mail.example.org"));
    }

    #[test]
    fn test_invalid_addresses() {
        for raw in [
            "",
            "plain",
            "@example.com",
            "john@",
            "john@localhost",
            "john@@example.com",
            "jo hn@example.com",
            "john@exa_mple.com",
            ".john@example.com",
            "john..doe@example.com",
            "john@-example.com",
            "john@example..com",
        ] {
            assert!(parse_address(raw).is_none(), "{:?} should be rejected", raw);
        }
    }
}
