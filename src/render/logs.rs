//! Render Logs
//!
//! Log reads come in two flavours that share one query type: scoped to a
//! single service (`GET /services/:id/logs`) or spanning the whole account
//! (`GET /logs`). The presence of `service_id` alone picks between them.
//!
//! Pagination is by time window. A page with `has_more` set carries the
//! bounds of the next window; [`LogQueryResult::next_query`] turns them into
//! the follow-up query. Nothing here loops on its own.
//!
//! Unlike the other operations, [`RenderClient::get_logs`] never fails: any
//! error is logged and replaced by an empty page.

use super::client::{path_segment, RenderClient, ResponseMapping};
use super::error::Result;
use super::types::{LogLevel, LogQueryResult};

/// Filters for a log read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Restricts the read to one service; consumed by the path, never sent as a parameter
    pub service_id: Option<String>,
    /// ISO-8601 lower bound
    pub start_time: Option<String>,
    /// ISO-8601 upper bound
    pub end_time: Option<String>,
    pub limit: Option<u32>,
    pub level: Option<LogLevel>,
}

impl LogQuery {
    /// Account-wide query
    pub fn new() -> Self {
        Self::default()
    }

    /// Query scoped to one service
    pub fn for_service(service_id: impl Into<String>) -> Self {
        Self {
            service_id: Some(service_id.into()),
            ..Self::default()
        }
    }

    pub fn start_time(mut self, start_time: impl Into<String>) -> Self {
        self.start_time = Some(start_time.into());
        self
    }

    pub fn end_time(mut self, end_time: impl Into<String>) -> Self {
        self.end_time = Some(end_time.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Resolve the query into the endpoint and parameters to send
    pub fn resolve(&self) -> Result<LogRequest> {
        let path = match &self.service_id {
            Some(id) => format!("/services/{}/logs", path_segment("service id", id)?),
            None => "/logs".to_string(),
        };

        let mut params = Vec::new();
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(level) = &self.level {
            params.push(("level".to_string(), level.as_str().to_string()));
        }
        if let Some(start) = &self.start_time {
            params.push(("startTime".to_string(), start.clone()));
        }
        if let Some(end) = &self.end_time {
            params.push(("endTime".to_string(), end.clone()));
        }

        Ok(LogRequest { path, params })
    }
}

/// A resolved log read: where it goes and what it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRequest {
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl LogRequest {
    pub fn is_scoped(&self) -> bool {
        self.path.starts_with("/services/")
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl LogQueryResult {
    /// The result returned in place of any failed log read
    pub fn empty() -> Self {
        Self {
            logs: Vec::new(),
            has_more: false,
            next_start_time: None,
            next_end_time: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Query for the next window, keeping scope and filters of `previous`
    ///
    /// `None` when the stream is exhausted; cursors on a final page are ignored.
    pub fn next_query(&self, previous: &LogQuery) -> Option<LogQuery> {
        if !self.has_more {
            return None;
        }

        let mut next = previous.clone();
        if let Some(start) = &self.next_start_time {
            next.start_time = Some(start.clone());
        }
        if let Some(end) = &self.next_end_time {
            next.end_time = Some(end.clone());
        }
        Some(next)
    }
}

impl RenderClient {
    pub const GET_LOGS: ResponseMapping = ResponseMapping::PassThrough;

    /// Read one page of logs, scoped or account-wide
    ///
    /// Endpoint: GET /services/:serviceId/logs or GET /logs
    ///
    /// Failures are absorbed: the caller always gets a usable page, empty
    /// with `has_more == false` when the read did not succeed.
    pub async fn get_logs(&self, query: &LogQuery) -> LogQueryResult {
        match self.fetch_logs(query).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("Log fetch failed, returning empty page: {}", err);
                LogQueryResult::empty()
            }
        }
    }

    async fn fetch_logs(&self, query: &LogQuery) -> Result<LogQueryResult> {
        let request = query.resolve()?;
        let body = self.http.get(&request.path, &request.params).await?;
        Self::GET_LOGS.apply(body)
    }
}
