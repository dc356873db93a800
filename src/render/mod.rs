//! Render API interaction module
//!
//! This module provides the typed client for the Render platform API:
//! service listing and lookup, deploy triggering, log reads and a
//! connectivity check.
//!
//! # Module Structure
//!
//! - [`client`] - Main Render client and per-operation response mapping
//! - [`error`] - Error type shared by the propagating operations
//! - [`http`] - HTTP transport bound to a base URL and API key
//! - [`logs`] - Log query resolution and the failure-absorbing log read
//! - [`types`] - Request and response data types
//!
//! # Example
//!
//! ```no_run
//! use trender::render::{LogQuery, RenderClient};
//!
//! async fn example() -> trender::render::Result<()> {
//!     let client = RenderClient::new("rnd_xxx")?;
//!     let service = client.get_service("srv-123").await?;
//!     let page = client.get_logs(&LogQuery::for_service(&service.id).limit(100)).await;
//!     println!("{} lines", page.logs.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod logs;
pub mod types;

pub use client::{RenderClient, ResponseMapping};
pub use error::{RenderError, Result};
pub use http::{format_render_error, RenderHttpClient, DEFAULT_BASE_URL};
pub use logs::{LogQuery, LogRequest};
pub use types::{
    DeployOptions, DeployStatus, Deployment, ListServicesParams, LogEntry, LogLevel,
    LogQueryResult, ServiceListEnvelope, ServiceSummary, ServiceType,
};
