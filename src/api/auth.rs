//! Authentication endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::gateway::{Gateway, GatewayError};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REGISTER_PATH: &str = "/api/auth/register";
pub const ME_PATH: &str = "/api/auth/me";

/// Authenticated user as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub created_at: Option<String>,
    /// Fields this client does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Full name when set, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }
}

/// OAuth2 password-flow form. The backend names the identifier field `username`
/// even though it holds the email address.
#[derive(Debug, Serialize)]
pub struct LoginForm<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    pub full_name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: UserProfile,
}

pub async fn login(gateway: &Gateway, form: &LoginForm<'_>) -> Result<TokenResponse, GatewayError> {
    gateway.post_form(LOGIN_PATH, form).await
}

pub async fn register(
    gateway: &Gateway,
    request: &RegisterRequest<'_>,
) -> Result<TokenResponse, GatewayError> {
    gateway.post_json(REGISTER_PATH, request).await
}

pub async fn me(gateway: &Gateway) -> Result<UserProfile, GatewayError> {
    gateway.get(ME_PATH).await
}
