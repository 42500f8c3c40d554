use std::sync::Arc;

use http::StatusCode;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use crate::session::SessionManager;
use crate::utils::http_helpers::{failure_from_response, HttpFailure};

const REQUEST_FALLBACK: &str = "Request failed.";
const SESSION_EXPIRED: &str = "Session expired.";

/// An HTTP client bound to the current session.
///
/// Build one fresh per logical request sequence via
/// `SessionManager::authenticated_client`; interceptor state is attached
/// per instance. Every dispatch re-reads the token from storage so a
/// rotation by a concurrent writer wins over the value captured at
/// construction, and any 401 response evicts the session globally.
pub struct AuthClient {
    session: Arc<SessionManager>,
    client: reqwest::Client,
    /// Token resolved when the client was built. Used as the fallback when
    /// storage has gone empty by dispatch time.
    initial_token: Option<String>,
}

impl AuthClient {
    pub(crate) async fn new(session: Arc<SessionManager>) -> Self {
        let initial_token = session.resolve_token().await;
        AuthClient {
            session,
            client: reqwest::Client::new(),
            initial_token,
        }
    }

    pub async fn get(&self, path: &str) -> Result<reqwest::Response, HttpFailure> {
        self.dispatch(Method::GET, path, None, &[]).await
    }

    pub async fn get_with_headers(
        &self,
        path: &str,
        headers: &[(String, String)],
    ) -> Result<reqwest::Response, HttpFailure> {
        self.dispatch(Method::GET, path, None, headers).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<reqwest::Response, HttpFailure> {
        self.dispatch(Method::POST, path, Some(body), &[]).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<reqwest::Response, HttpFailure> {
        self.dispatch(Method::PUT, path, Some(body), &[]).await
    }

    pub async fn delete(&self, path: &str) -> Result<reqwest::Response, HttpFailure> {
        self.dispatch(Method::DELETE, path, None, &[]).await
    }

    /// GET a JSON body, treating any non-success status as a failure.
    pub async fn get_json(&self, path: &str) -> Result<Value, HttpFailure> {
        self.get_json_with_headers(path, &[]).await
    }

    pub async fn get_json_with_headers(
        &self,
        path: &str,
        headers: &[(String, String)],
    ) -> Result<Value, HttpFailure> {
        let response = self.get_with_headers(path, headers).await?;
        if response.status().is_success() {
            response
                .json::<Value>()
                .await
                .map_err(|e| HttpFailure::transport(format!("Error parsing JSON: {}", e)))
        } else {
            Err(failure_from_response(response, REQUEST_FALLBACK).await)
        }
    }

    /// Relative paths are joined onto the configured API base URI; absolute
    /// URLs pass through untouched.
    fn absolute_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.session.base_uri(), path)
        }
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        headers: &[(String, String)],
    ) -> Result<reqwest::Response, HttpFailure> {
        let url = self.absolute_url(path);

        // Re-read the token immediately before sending; a fresh value wins
        // over the one captured at construction.
        let token = match self.session.resolve_token().await {
            Some(token) => Some(token),
            None => self.initial_token.clone(),
        };

        let mut request = self
            .client
            .request(method, &url)
            .header("Content-Type", "application/json");
        if let Some(token) = &token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        for (name, value) in headers {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!("Dispatching authenticated request to: {}", url);
        let response = request
            .send()
            .await
            .map_err(|e| HttpFailure::transport(format!("Error sending request: {}", e)))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Received 401 from '{}'; evicting session.", url);
            self.session.expire().await;
            return Err(failure_from_response(response, SESSION_EXPIRED).await);
        }

        Ok(response)
    }
}
