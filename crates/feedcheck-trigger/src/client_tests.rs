// SPDX-License-Identifier: GPL-3.0-or-later

#[cfg(test)]
mod tests {
    use crate::{Trigger, TriggerClient, TriggerError, TriggerResponse};
    use feedcheck_config::TriggerConfig;
    use std::net::{SocketAddr, TcpListener};
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Address that nothing listens on; connecting to it is refused.
    fn refused_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        listener.local_addr().expect("local addr")
    }

    fn client_for(url: impl Into<String>, budget: u32) -> TriggerClient {
        TriggerClient::builder()
            .url(url)
            .retry_budget(budget)
            .retry_delay(Duration::from_millis(10))
            .timeout(Duration::from_secs(5))
            .build()
            .expect("client")
    }

    #[tokio::test]
    async fn test_fire_returns_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .and(header(
                "user-agent",
                concat!("feedcheck/", env!("CARGO_PKG_VERSION")),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(format!("{}/", server.uri()), 5);
        let response = client.fire().await.expect("trigger response");

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "OK");
        assert_eq!(response.attempts, 1);
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_error_status_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string(
                "error polling for packages - see logs for more information",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(server.uri(), 5);
        let response = client.fire().await.expect("status codes are not errors");

        assert_eq!(response.status, 500);
        assert_eq!(response.attempts, 1);
        assert!(!response.is_success());
        assert_eq!(response.processed_count(), None);
    }

    #[tokio::test]
    async fn test_refused_connection_exhausts_budget() {
        let addr = refused_addr();
        let client = client_for(format!("http://{}/", addr), 5);

        let err = client.fire().await.expect_err("endpoint is down");

        assert!(err.is_connection_failure());
        match err {
            TriggerError::Unreachable { attempts, .. } => assert_eq!(attempts, 6),
            other => panic!("expected Unreachable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_budget_tries_once() {
        let addr = refused_addr();
        let client = client_for(format!("http://{}/", addr), 0);

        match client.fire().await {
            Err(TriggerError::Unreachable { attempts, .. }) => assert_eq!(attempts, 1),
            other => panic!("expected Unreachable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_recovers_once_endpoint_comes_up() {
        let addr = refused_addr();
        let client = TriggerClient::builder()
            .url(format!("http://{}/", addr))
            .retry_budget(20)
            .retry_delay(Duration::from_millis(100))
            .build()
            .expect("client");

        let start_server = async {
            tokio::time::sleep(Duration::from_millis(250)).await;
            let listener = TcpListener::bind(addr).expect("rebind port");
            let server = MockServer::builder().listener(listener).start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_body_string("3 packages processed"))
                .mount(&server)
                .await;
            server
        };

        let (response, _server) = tokio::join!(client.fire(), start_server);
        let response = response.expect("endpoint came up within budget");

        assert!(response.attempts > 1, "attempts = {}", response.attempts);
        assert!(response.attempts <= 21);
    }

    #[test]
    fn test_invalid_url_fails_fast() {
        let err = TriggerClient::builder()
            .url("not a url")
            .build()
            .expect_err("invalid url");
        assert!(matches!(err, TriggerError::InvalidUrl(_)));
        assert!(!err.is_connection_failure());
    }

    #[test]
    fn test_from_config() {
        let config = TriggerConfig {
            url: "http://feeds.internal:9000/poll".to_string(),
            retry_budget: 2,
            retry_delay_secs: 1,
            request_timeout_secs: 10,
        };
        let client = TriggerClient::from_config(&config).expect("client");
        assert_eq!(client.url().as_str(), "http://feeds.internal:9000/poll");
        assert_eq!(client.retry_budget(), 2);
    }

    #[test]
    fn test_default_client_targets_local_poller() {
        let client = TriggerClient::new().expect("client");
        assert_eq!(client.url().as_str(), "http://127.0.0.1:8080/");
        assert_eq!(client.retry_budget(), 5);
    }

    #[test]
    fn test_processed_count() {
        let response = TriggerResponse {
            status: 200,
            body: "42 packages processed".to_string(),
            attempts: 1,
        };
        assert_eq!(response.processed_count(), Some(42));

        let response = TriggerResponse {
            status: 200,
            body: "OK".to_string(),
            attempts: 1,
        };
        assert_eq!(response.processed_count(), None);
    }
}
