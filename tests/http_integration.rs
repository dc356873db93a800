//! Integration tests for the Render client using wiremock
//!
//! These tests run every operation against a mocked API and check the path,
//! the query or body sent, and the value handed back to the caller.

use serde_json::json;
use trender::render::{
    DeployOptions, DeployStatus, ListServicesParams, LogLevel, LogQuery, LogQueryResult,
    RenderClient, RenderError, ServiceType,
};
use wiremock::matchers::{bearer_token, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const API_KEY: &str = "test-api-key";

fn client_for(server: &MockServer) -> RenderClient {
    RenderClient::with_base_url(API_KEY, &server.uri()).expect("client should build")
}

/// Query pairs of the only request the server received
async fn sent_query(server: &MockServer) -> Vec<(String, String)> {
    let requests: Vec<Request> = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1, "exactly one request expected");
    requests[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn pair(k: &str, v: &str) -> (String, String) {
    (k.to_string(), v.to_string())
}

/// Test module for service operations
mod service_tests {
    use super::*;

    /// Listing forwards the filter bag and returns the envelope untouched
    #[tokio::test]
    async fn test_list_services_passes_envelope_through() {
        let server = MockServer::start().await;

        let envelope = json!({
            "data": [
                {"id": "srv-123", "name": "Test Service", "type": "web_service", "region": "oregon"}
            ],
            "cursor": "next-page"
        });

        Mock::given(method("GET"))
            .and(path("/services"))
            .and(bearer_token(API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(&envelope))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client
            .list_services(&ListServicesParams::new().limit(10).filter("env", "prod"))
            .await
            .expect("listing should succeed");

        assert_eq!(serde_json::to_value(&result).unwrap(), envelope);
        assert_eq!(result.cursor.as_deref(), Some("next-page"));
        assert_eq!(result.data[0].service_type, Some(ServiceType::WebService));
        assert_eq!(
            sent_query(&server).await,
            vec![pair("limit", "10"), pair("env", "prod")]
        );
    }

    /// The cursor from one page is sent back verbatim for the next
    #[tokio::test]
    async fn test_list_services_forwards_cursor() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services"))
            .and(query_param("cursor", "opaque==token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let page = client_for(&server)
            .list_services(&ListServicesParams::new().cursor("opaque==token"))
            .await
            .expect("listing should succeed");

        assert!(page.data.is_empty());
        assert!(!page.has_next_page());
    }

    /// Unknown types, missing names and extra envelope keys come back as sent
    #[tokio::test]
    async fn test_list_services_keeps_unmodelled_data() {
        let server = MockServer::start().await;

        let envelope = json!({
            "data": [
                {"id": "srv-1", "name": "kv", "type": "key_value"},
                {"id": "srv-2", "type": "web_service"},
                {"id": "srv-3", "name": "cron", "type": "cron_job", "schedule": "*/5 * * * *"}
            ],
            "cursor": "c",
            "total": 3
        });

        Mock::given(method("GET"))
            .and(path("/services"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&envelope))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .list_services(&ListServicesParams::new())
            .await
            .expect("listing should succeed");

        assert_eq!(serde_json::to_value(&result).unwrap(), envelope);
        assert_eq!(
            result.data[0].service_type,
            Some(ServiceType::Other("key_value".to_string()))
        );
        assert_eq!(result.data[1].name, None);
        assert_eq!(result.extra["total"], 3);
    }

    /// Single-service fetch unwraps the `data` field
    #[tokio::test]
    async fn test_get_service_unwraps_data() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/srv-123"))
            .and(bearer_token(API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": "srv-123", "name": "Test Service", "type": "web_service"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = client_for(&server)
            .get_service("srv-123")
            .await
            .expect("fetch should succeed");

        assert_eq!(
            serde_json::to_value(&service).unwrap(),
            json!({"id": "srv-123", "name": "Test Service", "type": "web_service"})
        );
    }

    /// 404 surfaces as NotFound with the server's message
    #[tokio::test]
    async fn test_get_service_not_found_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/srv-missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"id": "not_found", "message": "service not found"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_service("srv-missing")
            .await
            .expect_err("404 should be an error");

        assert!(matches!(err, RenderError::NotFound(ref m) if m == "service not found"));
    }

    /// 401 surfaces as Unauthorized
    #[tokio::test]
    async fn test_401_returns_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "invalid key"})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .list_services(&ListServicesParams::new())
            .await
            .expect_err("401 should be an error");

        assert!(matches!(err, RenderError::Unauthorized));
    }

    /// A 2xx body that is not the expected shape is a parse error, not a panic
    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/srv-123"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_service("srv-123")
            .await
            .expect_err("HTML should not decode");

        assert!(matches!(err, RenderError::Parse(_)));
    }
}

/// Test module for deploys
mod deploy_tests {
    use super::*;

    /// Deploy posts the options as the exact body and unwraps the deployment
    #[tokio::test]
    async fn test_deploy_service_posts_options() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/srv-123/deploys"))
            .and(bearer_token(API_KEY))
            .and(body_json(json!({"clearCache": true})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {"id": "dep-123", "status": "created"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let deployment = client_for(&server)
            .deploy_service("srv-123", &DeployOptions { clear_cache: true })
            .await
            .expect("deploy should succeed");

        assert_eq!(deployment.id, "dep-123");
        assert_eq!(deployment.status, DeployStatus::Created);
        assert!(sent_query(&server).await.is_empty());
    }

    /// Server errors on deploy propagate
    #[tokio::test]
    async fn test_deploy_server_error_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/srv-123/deploys"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .deploy_service("srv-123", &DeployOptions::default())
            .await
            .expect_err("503 should be an error");

        assert!(matches!(err, RenderError::Server { status: 503, .. }));
    }
}

/// Test module for log reads
mod logs_tests {
    use super::*;

    /// Scoped query targets the service path and drops serviceId from params
    #[tokio::test]
    async fn test_get_logs_for_service() {
        let server = MockServer::start().await;

        let page = json!({
            "logs": [
                {
                    "id": "log-1",
                    "timestamp": "2024-01-01T12:00:00Z",
                    "level": "info",
                    "message": "Server started",
                    "instanceId": "inst-123"
                },
                {
                    "id": "log-2",
                    "timestamp": "2024-01-01T12:00:01Z",
                    "level": "error",
                    "message": "Connection failed",
                    "instanceId": "inst-123"
                }
            ],
            "hasMore": true,
            "nextStartTime": "2024-01-01T12:00:02Z",
            "nextEndTime": "2024-01-01T12:00:10Z"
        });

        Mock::given(method("GET"))
            .and(path("/services/srv-123/logs"))
            .and(bearer_token(API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(&page))
            .expect(1)
            .mount(&server)
            .await;

        let query = LogQuery::for_service("srv-123")
            .limit(100)
            .level(LogLevel::Error);
        let result = client_for(&server).get_logs(&query).await;

        assert_eq!(serde_json::to_value(&result).unwrap(), page);
        assert_eq!(
            sent_query(&server).await,
            vec![pair("limit", "100"), pair("level", "error")]
        );

        let next = result.next_query(&query).expect("more pages");
        assert_eq!(next.start_time.as_deref(), Some("2024-01-01T12:00:02Z"));
        assert_eq!(next.end_time.as_deref(), Some("2024-01-01T12:00:10Z"));
    }

    /// Global query targets /logs and forwards the time bounds
    #[tokio::test]
    async fn test_get_logs_across_account() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/logs"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"logs": [], "hasMore": false})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let query = LogQuery::new()
            .start_time("2024-01-01T00:00:00Z")
            .end_time("2024-01-01T23:59:59Z");
        let result = client_for(&server).get_logs(&query).await;

        assert_eq!(result, LogQueryResult::empty());
        assert_eq!(
            sent_query(&server).await,
            vec![
                pair("startTime", "2024-01-01T00:00:00Z"),
                pair("endTime", "2024-01-01T23:59:59Z"),
            ]
        );
    }

    /// Any failure becomes the empty page instead of an error
    #[tokio::test]
    async fn test_get_logs_absorbs_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/srv-123/logs"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .get_logs(&LogQuery::for_service("srv-123"))
            .await;

        assert_eq!(result, LogQueryResult::empty());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"logs": [], "hasMore": false})
        );
    }

    /// Undecodable bodies are absorbed too
    #[tokio::test]
    async fn test_get_logs_absorbs_bad_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/logs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
            .mount(&server)
            .await;

        let result = client_for(&server).get_logs(&LogQuery::new()).await;
        assert_eq!(result, LogQueryResult::empty());
    }

    /// One incomplete entry does not cost the rest of a good page
    #[tokio::test]
    async fn test_get_logs_keeps_page_with_partial_entry() {
        let server = MockServer::start().await;

        let page = json!({
            "logs": [
                {
                    "id": "log-1",
                    "timestamp": "2024-01-01T12:00:00Z",
                    "level": "warn",
                    "message": "Slow response",
                    "instanceId": "inst-1"
                },
                {
                    "timestamp": "2024-01-01T12:00:01Z",
                    "level": "notice",
                    "message": "entry without id"
                }
            ],
            "hasMore": false
        });

        Mock::given(method("GET"))
            .and(path("/services/srv-123/logs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&page))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .get_logs(&LogQuery::for_service("srv-123"))
            .await;

        assert_eq!(result.logs.len(), 2);
        assert_eq!(result.logs[1].id, None);
        assert_eq!(result.logs[1].message.as_deref(), Some("entry without id"));
        assert_eq!(serde_json::to_value(&result).unwrap(), page);
    }

    /// Network failures are absorbed
    #[tokio::test]
    async fn test_get_logs_absorbs_network_error() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        drop(server);

        let result = client.get_logs(&LogQuery::for_service("srv-123")).await;
        assert_eq!(result, LogQueryResult::empty());
    }
}

/// Test module for the connectivity check
mod connection_tests {
    use super::*;

    /// The check succeeds with a bounded listing
    #[tokio::test]
    async fn test_connection_true_on_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services"))
            .and(query_param("limit", "1"))
            .and(bearer_token(API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client_for(&server).test_connection().await);
    }

    /// The check reports false on failure instead of erroring
    #[tokio::test]
    async fn test_connection_false_on_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        assert!(!client_for(&server).test_connection().await);
    }

    /// Concurrent calls on one client are independent
    #[tokio::test]
    async fn test_client_is_shareable_across_tasks() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(4)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move { client.test_connection().await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.expect("task should not panic"));
        }
    }
}
