//! Render API data types
//!
//! Read-only projections of server state. Every value is rebuilt from the
//! response of a single call; nothing here is cached.
//!
//! Listing and log responses are handed back as the server sent them, so
//! every type here re-serializes to its input: enum values this client does
//! not know are kept verbatim, optional fields stay absent, and unmodelled
//! keys land in a flattened `extra` map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Wire-string enum whose unrecognised values are carried in `Other`
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)*
            /// Value this client does not model, kept as sent
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $wire,)*
                    $name::Other(raw) => raw,
                }
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                let known = match raw.as_str() {
                    $($wire => Some($name::$variant),)*
                    _ => None,
                };
                known.unwrap_or_else(|| $name::Other(raw))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Other(raw) => raw,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// =========================================================================
// Services
// =========================================================================

wire_enum! {
    /// Kind of deployable service
    pub enum ServiceType {
        WebService => "web_service",
        BackgroundWorker => "background_worker",
        CronJob => "cron_job",
        StaticSite => "static_site",
        PrivateService => "private_service",
    }
}

impl std::str::FromStr for ServiceType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ServiceType::from(s.to_string()))
    }
}

/// A service as listed by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
    /// Fields this client does not model, kept as the server sent them
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceSummary {
    /// Name to show a human, falling back to the id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// One page of services plus the cursor for the next one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceListEnvelope {
    pub data: Vec<ServiceSummary>,
    /// Opaque token; absent on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceListEnvelope {
    pub fn has_next_page(&self) -> bool {
        self.cursor.is_some()
    }
}

/// Filters for the service listing, forwarded verbatim as query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListServicesParams {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    pub service_type: Option<ServiceType>,
    pub name: Option<String>,
    /// Additional filters passed through untouched, in insertion order
    pub extra: Vec<(String, String)>,
}

impl ListServicesParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn service_type(mut self, service_type: ServiceType) -> Self {
        self.service_type = Some(service_type);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add an arbitrary filter the typed fields do not cover
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Query pairs for the request; unset fields are left out
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(cursor) = &self.cursor {
            query.push(("cursor".to_string(), cursor.clone()));
        }
        if let Some(service_type) = &self.service_type {
            query.push(("type".to_string(), service_type.as_str().to_string()));
        }
        if let Some(name) = &self.name {
            query.push(("name".to_string(), name.clone()));
        }
        query.extend(self.extra.iter().cloned());
        query
    }
}

// =========================================================================
// Deploys
// =========================================================================

wire_enum! {
    /// Lifecycle state of a deployment
    pub enum DeployStatus {
        Created => "created",
        BuildInProgress => "build_in_progress",
        UpdateInProgress => "update_in_progress",
        PreDeployInProgress => "pre_deploy_in_progress",
        Live => "live",
        Deactivated => "deactivated",
        BuildFailed => "build_failed",
        UpdateFailed => "update_failed",
        PreDeployFailed => "pre_deploy_failed",
        Canceled => "canceled",
    }
}

impl DeployStatus {
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            DeployStatus::BuildFailed | DeployStatus::UpdateFailed | DeployStatus::PreDeployFailed
        )
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            DeployStatus::Created
                | DeployStatus::BuildInProgress
                | DeployStatus::UpdateInProgress
                | DeployStatus::PreDeployInProgress
        )
    }
}

/// Snapshot of a deployment at the time the API returned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    pub status: DeployStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of a deploy trigger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOptions {
    /// Drop the build cache before building
    pub clear_cache: bool,
}

// =========================================================================
// Logs
// =========================================================================

wire_enum! {
    /// Log severity
    ///
    /// Only the exact spellings map to variants; `"warn"` and friends stay
    /// in `Other` so they re-serialize unchanged.
    pub enum LogLevel {
        Debug => "debug",
        Info => "info",
        Warning => "warning",
        Error => "error",
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    /// Parse a filter value; accepts `warn` for `warning`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// A single log line
///
/// Every field is optional so one odd line cannot sink the page it came in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// ISO-8601
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of log lines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQueryResult {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_end_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
