//! Authentication Models
//! Mission: Define user accounts, roles and token claims for the job board

use serde::{Deserialize, Deserializer, Serialize};

/// Shortest accepted username (inclusive)
pub const USERNAME_MIN_LEN: usize = 3;
/// Longest accepted username (inclusive)
pub const USERNAME_MAX_LEN: usize = 30;
/// Shortest accepted password
pub const PASSWORD_MIN_LEN: usize = 6;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub role: UserRole,
    pub university_id: Option<i64>,
    pub created_at: String,
}

/// User roles for RBAC
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UserRole {
    #[serde(rename = "super_admin")]
    SuperAdmin, // Manages users and sees every posting
    #[serde(rename = "vip")]
    Vip, // Sees every posting
    #[serde(rename = "regular")]
    Regular, // Sees postings of their own university when affiliated
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::SuperAdmin, UserRole::Vip, UserRole::Regular];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::SuperAdmin => "super_admin",
            UserRole::Vip => "vip",
            UserRole::Regular => "regular",
        }
    }

    /// Parse the stored/wire form. Exact match only: roles are written by this
    /// service, so anything else is a bad request or a corrupt row.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "super_admin" => Some(UserRole::SuperAdmin),
            "vip" => Some(UserRole::Vip),
            "regular" => Some(UserRole::Regular),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: i64, // subject (user_id)
    pub role: UserRole,
    #[serde(default)]
    pub university_id: Option<i64>,
    pub iat: usize,
    pub exp: usize, // expiration timestamp
}

/// Login / registration request body
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

impl CredentialsRequest {
    /// Length checks applied at registration.
    pub fn validate(&self) -> Result<(), &'static str> {
        let len = self.username.chars().count();
        if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
            return Err("Username must be between 3 and 30 characters");
        }
        if self.password.chars().count() < PASSWORD_MIN_LEN {
            return Err("Password must be at least 6 characters");
        }
        Ok(())
    }
}

/// Token response for login and registration
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    /// Same value as `token`, under the OAuth2 field name the dashboard reads
    pub access_token: String,
    pub token_type: String,
    pub expires_in: usize, // seconds until expiration
    pub role: UserRole,
}

impl TokenResponse {
    pub fn bearer(token: String, expires_in: usize, role: UserRole) -> Self {
        Self {
            access_token: token.clone(),
            token,
            token_type: "bearer".to_string(),
            expires_in,
            role,
        }
    }
}

/// User response (sanitized)
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
    pub university_id: Option<i64>,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            university_id: user.university_id,
        }
    }
}

/// Body of `PUT /api/users/:id`.
///
/// The dashboard posts the whole edited row, so unknown fields are ignored and
/// `university_id` may arrive as a number, a numeric string, `""` or `null`.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub university_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdInput {
    Number(i64),
    Text(String),
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IdInput>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IdInput::Number(n)) => Ok(Some(n)),
        Some(IdInput::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse::<i64>()
                    .map(Some)
                    .map_err(|_| serde::de::Error::custom("university_id must be an integer"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_serialization() {
        let admin = UserRole::SuperAdmin;
        let json = serde_json::to_string(&admin).unwrap();
        assert_eq!(json, r#""super_admin""#);

        let vip: UserRole = serde_json::from_str(r#""vip""#).unwrap();
        assert_eq!(vip, UserRole::Vip);

        assert!(serde_json::from_str::<UserRole>(r#""admin""#).is_err());
    }

    #[test]
    fn test_user_role_string_conversion() {
        for role in UserRole::ALL {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::parse("REGULAR"), None);
        assert_eq!(UserRole::parse(""), None);
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: 1,
            username: "alice".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            role: UserRole::Regular,
            university_id: Some(7),
            created_at: "2025-01-01T00:00:00Z".to_string(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_token_response_carries_access_token() {
        let response = TokenResponse::bearer("abc.def.ghi".to_string(), 3600, UserRole::Vip);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["token"], "abc.def.ghi");
        assert_eq!(json["access_token"], "abc.def.ghi");
        assert_eq!(json["token_type"], "bearer");
        assert_eq!(json["role"], "vip");
    }

    #[test]
    fn test_credentials_length_checks() {
        let req = |u: &str, p: &str| CredentialsRequest {
            username: u.to_string(),
            password: p.to_string(),
        };
        assert!(req("bob", "secret").validate().is_ok());
        assert!(req("ab", "secret1").validate().is_err());
        assert!(req(&"x".repeat(31), "secret1").validate().is_err());
        assert!(req(&"x".repeat(30), "secret1").validate().is_ok());
        assert!(req("alice", "12345").validate().is_err());
    }

    #[test]
    fn test_update_request_accepts_dashboard_shapes() {
        let parsed: UpdateUserRequest =
            serde_json::from_str(r#"{"role":"vip","university_id":3}"#).unwrap();
        assert_eq!(parsed.university_id, Some(3));

        let parsed: UpdateUserRequest = serde_json::from_str(
            r#"{"id":5,"username":"bob","role":"regular","university_id":"12"}"#,
        )
        .unwrap();
        assert_eq!(parsed.role, "regular");
        assert_eq!(parsed.university_id, Some(12));

        let parsed: UpdateUserRequest =
            serde_json::from_str(r#"{"role":"regular","university_id":""}"#).unwrap();
        assert_eq!(parsed.university_id, None);

        let parsed: UpdateUserRequest =
            serde_json::from_str(r#"{"role":"regular","university_id":null}"#).unwrap();
        assert_eq!(parsed.university_id, None);

        let parsed: UpdateUserRequest = serde_json::from_str(r#"{"role":"regular"}"#).unwrap();
        assert_eq!(parsed.university_id, None);

        assert!(serde_json::from_str::<UpdateUserRequest>(
            r#"{"role":"regular","university_id":"abc"}"#
        )
        .is_err());
    }
}
