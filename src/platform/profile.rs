//! Profile payload returned by the web profile endpoint.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// `{ "count": n }` wrapper used for follower and following totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeCount {
    /// The total.
    pub count: u64,
}

/// Public profile information for one user.
///
/// Well-known fields are typed; everything else the endpoint returns is kept
/// in [`extra`](Self::extra).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileInfo {
    /// Numeric user id, as a decimal string.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Username.
    #[serde(default)]
    pub username: String,
    /// Display name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Profile biography.
    #[serde(default)]
    pub biography: Option<String>,
    /// Whether the account is private.
    #[serde(default)]
    pub is_private: Option<bool>,
    /// Whether the account is verified.
    #[serde(default)]
    pub is_verified: Option<bool>,
    /// Followers.
    #[serde(default)]
    pub edge_followed_by: Option<EdgeCount>,
    /// Accounts followed.
    #[serde(default)]
    pub edge_follow: Option<EdgeCount>,
    /// Remaining fields, untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProfileInfo {
    /// Number of followers, when the payload carries it.
    #[must_use]
    pub fn follower_count(&self) -> Option<u64> {
        self.edge_followed_by.map(|edge| edge.count)
    }

    /// Number of accounts this user follows, when the payload carries it.
    #[must_use]
    pub fn following_count(&self) -> Option<u64> {
        self.edge_follow.map(|edge| edge.count)
    }
}

/// `{ "data": { "user": ... } }` envelope of the profile endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ProfileEnvelope {
    pub(crate) data: ProfileData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileData {
    #[serde(default)]
    pub(crate) user: Option<ProfileInfo>,
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Text(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        RawId::Text(_) => Err(serde::de::Error::custom("user id is empty")),
        RawId::Number(number) => Ok(number.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_envelope_parses_typical_payload() {
        let json = r#"{
            "data": {
                "user": {
                    "id": "25025320",
                    "username": "janedoe",
                    "full_name": "Jane Doe",
                    "biography": "hi",
                    "is_private": false,
                    "edge_followed_by": {"count": 1200},
                    "edge_follow": {"count": 80},
                    "profile_pic_url": "https://cdn.example/p.jpg"
                }
            },
            "status": "ok"
        }"#;
        let envelope: ProfileEnvelope = serde_json::from_str(json).unwrap();
        let user = envelope.data.user.unwrap();
        assert_eq!(user.id, "25025320");
        assert_eq!(user.full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(user.follower_count(), Some(1200));
        assert_eq!(user.following_count(), Some(80));
        assert_eq!(user.is_private, Some(false));
        assert!(user.extra.contains_key("profile_pic_url"));
    }

    #[test]
    fn test_profile_accepts_numeric_id_and_nulls() {
        let json = r#"{"id": 42, "username": "x", "full_name": null, "is_private": null}"#;
        let user: ProfileInfo = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "42");
        assert_eq!(user.full_name, None);
        assert_eq!(user.is_private, None);
        assert_eq!(user.follower_count(), None);
    }

    #[test]
    fn test_profile_rejects_empty_id() {
        let json = r#"{"id": "  ", "username": "x"}"#;
        assert!(serde_json::from_str::<ProfileInfo>(json).is_err());
    }

    #[test]
    fn test_envelope_with_null_user() {
        let envelope: ProfileEnvelope =
            serde_json::from_str(r#"{"data": {"user": null}}"#).unwrap();
        assert!(envelope.data.user.is_none());
    }
}
