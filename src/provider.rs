use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::warn;

use crate::error::TranslateError;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Shared outbound client. Built once and cloned into each API client so they
/// reuse one connection pool.
pub fn http_client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Client for article pages. Redirects are not followed automatically so
/// every hop can be checked before it is requested.
pub fn page_client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<serde_json::Value>,
    message: String,
}

/// Turn a non-success provider response into a [`TranslateError::Provider`],
/// keeping the provider's own message when it sends one.
pub async fn provider_error(service: &str, response: Response) -> TranslateError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => match envelope.error.code {
            Some(code) if !code.is_null() => {
                let code = code.as_str().map(str::to_string).unwrap_or_else(|| code.to_string());
                format!("{} ({})", envelope.error.message, code)
            }
            _ => envelope.error.message,
        },
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => body.trim().to_string(),
    };

    warn!("{} returned {}: {}", service, status, message);
    TranslateError::Provider {
        status: status.as_u16(),
        message,
    }
}

/// Map a transport failure talking to a provider
pub fn network_error(service: &str, err: reqwest::Error) -> TranslateError {
    warn!("{} request failed: {}", service, err);
    TranslateError::Network(format!("{} is unreachable: {}", service, err))
}
