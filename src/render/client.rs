//! Render Client
//!
//! Typed operations over the Render REST API. Each operation owns its
//! endpoint path, its request shape and the rule that turns the decoded
//! body into the value handed back to the caller.

use super::error::{RenderError, Result};
use super::http::RenderHttpClient;
use super::types::{
    DeployOptions, Deployment, ListServicesParams, ServiceListEnvelope, ServiceSummary,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Page size used by the connectivity check
const CHECK_LIMIT: u32 = 1;

/// How an operation turns a response body into its return value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMapping {
    /// Body is already the public shape (envelopes whose cursor matters)
    PassThrough,
    /// Body wraps the resource under the named field; return only the resource
    Unwrap(&'static str),
}

impl ResponseMapping {
    /// Apply the mapping and decode the result
    pub fn apply<T: DeserializeOwned>(self, body: Value) -> Result<T> {
        let payload = match self {
            ResponseMapping::PassThrough => body,
            ResponseMapping::Unwrap(field) => match body {
                Value::Object(mut map) => map.remove(field).ok_or_else(|| {
                    RenderError::Parse(format!("response has no '{}' field", field))
                })?,
                other => {
                    return Err(RenderError::Parse(format!(
                        "expected an object wrapping '{}', got {}",
                        field,
                        json_kind(&other)
                    )))
                }
            },
        };

        Ok(serde_json::from_value(payload)?)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Percent-encode a path segment, rejecting empty identifiers
pub(crate) fn path_segment<'a>(what: &str, id: &'a str) -> Result<std::borrow::Cow<'a, str>> {
    if id.trim().is_empty() {
        return Err(RenderError::InvalidArgument(format!("{} must not be empty", what)));
    }
    Ok(urlencoding::encode(id))
}

/// Main Render client
///
/// Holds nothing but the configured transport, so it is cheap to clone and
/// safe to share between concurrent tasks.
#[derive(Debug, Clone)]
pub struct RenderClient {
    pub(crate) http: RenderHttpClient,
}

impl RenderClient {
    pub const LIST_SERVICES: ResponseMapping = ResponseMapping::PassThrough;
    pub const GET_SERVICE: ResponseMapping = ResponseMapping::Unwrap("data");
    pub const DEPLOY_SERVICE: ResponseMapping = ResponseMapping::Unwrap("data");

    /// Create a client for the public Render API
    pub fn new(api_key: &str) -> Result<Self> {
        Ok(Self::from_http(RenderHttpClient::new(api_key)?))
    }

    /// Create a client against a custom base URL (proxies, mock servers)
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        Ok(Self::from_http(RenderHttpClient::with_base_url(api_key, base_url)?))
    }

    /// Wrap an already configured transport
    pub fn from_http(http: RenderHttpClient) -> Self {
        Self { http }
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    // =========================================================================
    // Services
    // =========================================================================

    /// List services, one page at a time
    ///
    /// Endpoint: GET /services
    ///
    /// The envelope is returned as sent; pass `cursor` back through
    /// [`ListServicesParams::cursor`] to read the next page.
    pub async fn list_services(&self, params: &ListServicesParams) -> Result<ServiceListEnvelope> {
        let body = self.http.get("/services", &params.to_query()).await?;
        Self::LIST_SERVICES.apply(body)
    }

    /// Fetch a single service
    ///
    /// Endpoint: GET /services/:id
    pub async fn get_service(&self, id: &str) -> Result<ServiceSummary> {
        let path = format!("/services/{}", path_segment("service id", id)?);
        let body = self.http.get(&path, &[]).await?;
        Self::GET_SERVICE.apply(body)
    }

    // =========================================================================
    // Deploys
    // =========================================================================

    /// Trigger a deploy of a service
    ///
    /// Endpoint: POST /services/:id/deploys
    pub async fn deploy_service(&self, id: &str, options: &DeployOptions) -> Result<Deployment> {
        let path = format!("/services/{}/deploys", path_segment("service id", id)?);
        let body = self.http.post(&path, options).await?;
        let deployment: Deployment = Self::DEPLOY_SERVICE.apply(body)?;
        tracing::info!("Triggered deploy {} for service {}", deployment.id, id);
        Ok(deployment)
    }

    // =========================================================================
    // Connectivity
    // =========================================================================

    /// Check that the API is reachable and the key is accepted
    ///
    /// Performs a single one-item listing; any failure yields `false`.
    pub async fn test_connection(&self) -> bool {
        let check = ListServicesParams::new().limit(CHECK_LIMIT);
        match self.list_services(&check).await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!("Connection test failed: {}", err);
                false
            }
        }
    }
}
