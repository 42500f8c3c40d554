use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::models::User;
use crate::utils::http_helpers::{failure_from_response, HttpFailure};

/// Fallback messages used when the server rejects an operation without
/// explaining itself.
pub const LOGIN_FALLBACK: &str = "Login failed. Please check your credentials.";
pub const REGISTER_FALLBACK: &str = "Registration failed. Please try again.";
const VALIDATE_FALLBACK: &str = "Session validation failed.";
const REGISTER_SUCCESS: &str = "Registration successful.";

/// The config needed to reach the backend's auth endpoints.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct ApiConfig {
    /// Base URI of the backend, e.g. "https://health.example.edu".
    pub base_uri: String,
}

/// Success shape of the sign-in endpoint: the issued bearer token plus the
/// account fields.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub token: String,
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub user_code: String,
}

impl SignInResponse {
    /// Collapse into a User record carrying an embedded copy of the token.
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            full_name: self.full_name,
            roles: self.roles,
            user_code: self.user_code,
            token: Some(self.token),
        }
    }
}

/// Body of the sign-up endpoint.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: String,
    pub role: String,
}

/// A thin client for the backend's auth endpoints
/// (sign-in, sign-up, who-am-i).
pub struct AuthApi {
    config: ApiConfig,
    client: reqwest::Client,
}

impl AuthApi {
    pub fn new(config: &ApiConfig) -> Self {
        info!("Creating AuthApi for base URI '{}'", config.base_uri);
        Self {
            config: config.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Base URI of the backend this client talks to.
    pub fn base_uri(&self) -> &str {
        &self.config.base_uri
    }

    /// Calls the who-am-i endpoint with the provided token, returning the
    /// authoritative user record on success.
    pub async fn who_am_i(&self, token: &str) -> Result<User, HttpFailure> {
        let url = format!("{}/api/auth/me", self.config.base_uri);

        debug!("Sending who-am-i request to: {}", url);
        let response = self
            .client
            .get(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| HttpFailure::transport(format!("Error sending request: {}", e)))?;

        if response.status().is_success() {
            response
                .json::<User>()
                .await
                .map_err(|e| HttpFailure::transport(format!("Error parsing JSON: {}", e)))
        } else {
            Err(failure_from_response(response, VALIDATE_FALLBACK).await)
        }
    }

    /// Submits credentials to the sign-in endpoint.
    pub async fn sign_in(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SignInResponse, HttpFailure> {
        let url = format!("{}/api/auth/signin", self.config.base_uri);

        debug!("Sending sign-in request to: {}", url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .map_err(|e| HttpFailure::transport(format!("Error sending request: {}", e)))?;

        if response.status().is_success() {
            response
                .json::<SignInResponse>()
                .await
                .map_err(|e| HttpFailure::transport(format!("Error parsing JSON: {}", e)))
        } else {
            Err(failure_from_response(response, LOGIN_FALLBACK).await)
        }
    }

    /// Submits a sign-up request. Success returns the server's message;
    /// no session is established either way.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<String, HttpFailure> {
        let url = format!("{}/api/auth/signup", self.config.base_uri);

        debug!("Sending sign-up request to: {}", url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| HttpFailure::transport(format!("Error sending request: {}", e)))?;

        if response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|value| value["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| REGISTER_SUCCESS.to_string());
            Ok(message)
        } else {
            Err(failure_from_response(response, REGISTER_FALLBACK).await)
        }
    }
}
