//! User and authentication models

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role as reported by the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// User object returned by `/auth/me`, `/auth/login`, `/auth/register`
/// and listed by `/admin/users`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, rename = "nombre")]
    pub first_name: String,
    #[serde(default, rename = "apellidos")]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub credits: i64,
    #[serde(default)]
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// "First Last", falling back to the username when both are empty
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of `POST /auth/register`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellidos")]
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

impl RegisterRequest {
    /// Reject obviously malformed registrations before hitting the backend
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(Error::Validation("username must not be empty".into()));
        }
        if self.password.is_empty() {
            return Err(Error::Validation("password must not be empty".into()));
        }
        let at = self.email.find('@');
        if !matches!(at, Some(pos) if pos > 0 && pos < self.email.len() - 1) {
            return Err(Error::Validation(format!("invalid email: {}", self.email)));
        }
        Ok(())
    }
}

/// Response from `/auth/login` and `/auth/register`
///
/// Older deployments answer with `access_token`, newer ones with `token`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    pub user: User,
}

impl AuthResponse {
    /// The bearer credential, whichever field carried it
    pub fn credential(&self) -> Result<&str> {
        self.token
            .as_deref()
            .or(self.access_token.as_deref())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::InvalidData("auth response carried no token".into()))
    }
}

/// Response from `GET /user/credits`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub credits: i64,
}

/// Locally stored session (encrypted token stored separately)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSession {
    pub id: i64,
    /// Backend the credential belongs to; one saved session per backend
    pub base_url: String,
    pub username: String,
    pub user_id: Option<String>,
    pub saved_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_from_backend_json() {
        let json = r#"{
            "id": "7f0c",
            "nombre": "Ada",
            "apellidos": "Lovelace",
            "email": "ada@example.com",
            "username": "ada",
            "credits": 42,
            "role": "admin"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.credits, 42);
        assert!(user.is_admin());
        assert_eq!(user.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_user_defaults_to_plain_role() {
        let user: User = serde_json::from_str(r#"{"id":"1","username":"bob"}"#).unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.credits, 0);
        assert_eq!(user.display_name(), "bob");
    }

    #[test]
    fn test_auth_response_accepts_either_token_field() {
        let user = r#"{"id":"1","username":"bob","credits":0,"role":"user"}"#;
        let a: AuthResponse =
            serde_json::from_str(&format!(r#"{{"token":"abc","user":{}}}"#, user)).unwrap();
        let b: AuthResponse =
            serde_json::from_str(&format!(r#"{{"access_token":"xyz","user":{}}}"#, user)).unwrap();
        assert_eq!(a.credential().unwrap(), "abc");
        assert_eq!(b.credential().unwrap(), "xyz");
    }

    #[test]
    fn test_auth_response_without_token_is_invalid() {
        let r: AuthResponse =
            serde_json::from_str(r#"{"user":{"id":"1","username":"bob"}}"#).unwrap();
        assert!(matches!(r.credential(), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_register_request_serializes_backend_field_names() {
        let req = RegisterRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            username: "ada".into(),
            password: "pw".into(),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["nombre"], "Ada");
        assert_eq!(v["apellidos"], "Lovelace");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_register_request_rejects_bad_email() {
        let req = RegisterRequest {
            first_name: String::new(),
            last_name: String::new(),
            email: "nope@".into(),
            username: "ada".into(),
            password: "pw".into(),
        };
        assert!(matches!(req.validate(), Err(Error::Validation(_))));
    }
}
