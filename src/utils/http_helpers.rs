use http::StatusCode;
use serde_json::Value;

/// A failure reported by the backend or the transport layer.
///
/// `status` is the response status when the server answered, or None when
/// the request never completed (DNS, refused connection, malformed body).
#[derive(Debug, Clone)]
pub struct HttpFailure {
    pub status: Option<StatusCode>,
    pub message: String,
}

impl HttpFailure {
    /// A failure for a request that never produced a response.
    pub fn transport(message: impl Into<String>) -> Self {
        HttpFailure {
            status: None,
            message: message.into(),
        }
    }

    /// True when the server rejected the credentials outright. A 401 always
    /// means the session is no longer valid.
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(StatusCode::UNAUTHORIZED)
    }
}

impl std::fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Builds an HttpFailure from a non-success response, preferring the
/// server's `message` body field over the given fallback.
pub async fn failure_from_response(response: reqwest::Response, fallback: &str) -> HttpFailure {
    let status = response.status();
    let message = match response.text().await {
        Ok(body) => serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| value["message"].as_str().map(str::to_string))
            .unwrap_or_else(|| fallback.to_string()),
        Err(_) => fallback.to_string(),
    };

    HttpFailure {
        status: Some(status),
        message,
    }
}
