use log::warn;
use reqwest::{Client, RequestBuilder, Response};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

use crate::auth::Token;
use crate::error::{ClusterError, Result};

const MAX_CONCURRENT_REQUESTS: usize = 16;

/// Connection settings for [`ClusterClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub insecure_skip_tls_verify: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 5,
            retry_delay: Duration::from_secs(2),
            insecure_skip_tls_verify: false,
        }
    }
}

/// Which failures [`ClusterClient::execute`] may retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RetryPolicy {
    /// Reads and other requests that are safe to repeat: retry network
    /// errors, rate limits and server errors.
    Idempotent,
    /// Requests with side effects: retry only when the server never saw the
    /// request (connection failures) or explicitly turned it away (429).
    ConnectOnly,
}

/// REST client for the cluster API server.
///
/// Serves both the base orchestration API (`/api/v1`) and the platform API
/// group (`/oapi/v1`) from a single server URL.
pub struct ClusterClient {
    pub client: Client,
    pub server: Url,
    pub token: Option<Token>,
    options: ClientOptions,
    semaphore: Arc<Semaphore>,
}

impl ClusterClient {
    pub fn new(server: &str, token: Option<Token>, options: ClientOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("pipeline-template/", env!("CARGO_PKG_VERSION")))
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.insecure_skip_tls_verify)
            .build()
            .map_err(|e| ClusterError::Config(format!("Failed to create HTTP client: {e}")))?;

        // Url::join drops the last path segment unless it ends with a slash
        let normalized = if server.ends_with('/') {
            server.to_string()
        } else {
            format!("{server}/")
        };
        let server = Url::parse(&normalized)
            .map_err(|e| ClusterError::Config(format!("Invalid server URL: {e}")))?;

        Ok(Self {
            client,
            server,
            token,
            options,
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS)),
        })
    }

    pub fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    /// Resolves `path` (relative, no leading slash) against the server URL.
    pub(super) fn endpoint(&self, path: &str) -> Result<Url> {
        self.server
            .join(path)
            .map_err(|e| ClusterError::Config(format!("Invalid API path {path}: {e}")))
    }

    /// Sends a request, retrying the failures `policy` allows. `build` is
    /// called once per attempt.
    ///
    /// A 404 is reported as [`ClusterError::NotFound`] naming `what`.
    pub(super) async fn execute<F>(
        &self,
        what: &str,
        policy: RetryPolicy,
        build: F,
    ) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| ClusterError::Config(format!("Request limiter closed: {e}")))?;

        let max_retries = self.options.max_retries;
        let delay = self.options.retry_delay;
        let mut retry_count = 0;
        loop {
            let request = self.auth_request(build());

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e)
                    if e.is_connect()
                        || (policy == RetryPolicy::Idempotent && e.is_timeout()) =>
                {
                    if retry_count >= max_retries {
                        return Err(e.into());
                    }
                    warn!(
                        "Network error ({}), retrying in {:?} ({}/{})...",
                        e,
                        delay,
                        retry_count + 1,
                        max_retries
                    );
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();

            let retryable = status == 429
                || (policy == RetryPolicy::Idempotent && status.is_server_error());
            if retryable {
                if retry_count >= max_retries {
                    return Err(ClusterError::ApiErrorAfterRetries {
                        status: status.as_u16(),
                        retries: max_retries,
                    });
                }

                warn!(
                    "Cluster API error (status {status}) for {what}. Waiting {delay:?} before retry {}/{}...",
                    retry_count + 1,
                    max_retries
                );

                tokio::time::sleep(delay).await;
                retry_count += 1;
                continue;
            }

            if status == 404 {
                return Err(ClusterError::NotFound(what.to_string()));
            }

            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read error response".to_string());
                return Err(ClusterError::Api {
                    status: status.as_u16(),
                    message: error_text,
                });
            }

            return Ok(response);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_url_is_normalized() {
        let client =
            ClusterClient::new("https://cluster.example.com:8443/prefix", None, ClientOptions::default())
                .unwrap();
        assert_eq!(
            client.endpoint("api/v1/namespaces").unwrap().as_str(),
            "https://cluster.example.com:8443/prefix/api/v1/namespaces"
        );
    }

    #[test]
    fn test_invalid_server_url() {
        let result = ClusterClient::new("not a url", None, ClientOptions::default());
        assert!(matches!(result, Err(ClusterError::Config(_))));
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_gives_up() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/namespaces")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let options = ClientOptions {
            max_retries: 2,
            retry_delay: Duration::from_millis(1),
            ..ClientOptions::default()
        };
        let client = ClusterClient::new(&server.url(), None, options).unwrap();
        let url = client.endpoint("api/v1/namespaces").unwrap();

        let result = client
            .execute("namespaces", RetryPolicy::Idempotent, || {
                client.client.get(url.clone())
            })
            .await;

        assert!(matches!(
            result,
            Err(ClusterError::ApiErrorAfterRetries {
                status: 503,
                retries: 2
            })
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/namespaces")
            .match_header("authorization", "Bearer sha256~token")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = ClusterClient::new(
            &server.url(),
            Some(Token::from("sha256~token")),
            ClientOptions::default(),
        )
        .unwrap();
        let url = client.endpoint("api/v1/namespaces").unwrap();

        let result = client
            .execute("namespaces", RetryPolicy::Idempotent, || {
                client.client.get(url.clone())
            })
            .await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }
}
