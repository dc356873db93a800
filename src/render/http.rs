//! HTTP transport for Render REST API calls

use super::error::{RenderError, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Public Render API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.render.com/v1";

const USER_AGENT: &str = concat!("trender/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Truncate a response body and strip control characters before logging it
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Error body shape returned by the Render API
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client bound to one base URL and one API key
///
/// The key is installed as a default `Authorization` header when the client
/// is built, so individual calls never see it.
#[derive(Clone)]
pub struct RenderHttpClient {
    client: Client,
    base_url: Url,
}

impl std::fmt::Debug for RenderHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderHttpClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RenderHttpClient {
    /// Create a client against the public Render API
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom base URL
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| RenderError::InvalidApiKey)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Base URL every path is resolved against
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Make a GET request with the given query parameters
    pub async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!("GET {} ({} params)", url, query.len());

        let response = self.client.get(&url).query(query).send().await?;
        Self::read_json(response).await
    }

    /// Make a POST request with a JSON body
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        Self::read_json(response).await
    }

    async fn read_json(response: Response) -> Result<Value> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(RenderError::from_status(status.as_u16(), message));
        }

        // Handle empty response
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Format a Render API error for display
/// Security: Sanitizes error messages to avoid leaking API details
pub fn format_render_error(error: &RenderError) -> String {
    match error {
        RenderError::Unauthorized => {
            "Authentication failed. Check RENDER_API_KEY or run 'trender config --key'."
                .to_string()
        }
        RenderError::PermissionDenied(_) => {
            "Permission denied. The API key cannot access this resource.".to_string()
        }
        RenderError::NotFound(_) => "Resource not found.".to_string(),
        RenderError::RateLimited => "Rate limit exceeded. Please try again later.".to_string(),
        RenderError::Server { .. } => {
            "Render API temporarily unavailable. Please try again.".to_string()
        }
        RenderError::Http(_) => {
            "Request failed. Check your network connection and try again.".to_string()
        }
        RenderError::Api { status, message } if *status == 400 || *status == 422 => {
            format!("Invalid request: {}", truncate_message(message))
        }
        RenderError::Api { status, .. } => format!("Request rejected ({}).", status),
        other => truncate_message(&other.to_string()),
    }
}

/// Keep up to 80 printable characters; the ellipsis marks dropped text only
fn truncate_message(message: &str) -> String {
    let mut printable = message.chars().filter(|c| c.is_ascii_graphic() || *c == ' ');
    let kept = printable.by_ref().take(80).collect::<String>();

    if printable.next().is_some() {
        format!("{}...", kept)
    } else {
        kept
    }
}
