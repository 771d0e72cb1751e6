use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_TYPE;

use super::core::{ClusterClient, RetryPolicy};
use crate::cluster::api::ResourceCreator;
use crate::cluster::types::ResourceGroup;
use crate::error::Result;

#[async_trait]
impl ResourceCreator for ClusterClient {
    async fn create(
        &self,
        group: ResourceGroup,
        namespace: &str,
        resource: &str,
        body: &[u8],
    ) -> Result<()> {
        let url = self.endpoint(&format!(
            "{}namespaces/{namespace}/{resource}",
            group.api_prefix()
        ))?;
        debug!("POST {url} ({} bytes)", body.len());

        // A create may have been stored before a timeout or 5xx, so only
        // failures the server never acted on are retried.
        let what = format!("{resource} in namespace {namespace}");
        self.execute(&what, RetryPolicy::ConnectOnly, || {
            self.client
                .post(url.clone())
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_vec())
        })
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::client::ClientOptions;
    use crate::error::ClusterError;

    fn client_for(server: &mockito::Server) -> ClusterClient {
        client_with_retries(server, 0)
    }

    fn client_with_retries(server: &mockito::Server, max_retries: u32) -> ClusterClient {
        let options = ClientOptions {
            max_retries,
            retry_delay: std::time::Duration::from_millis(1),
            ..ClientOptions::default()
        };
        ClusterClient::new(&server.url(), None, options).unwrap()
    }

    #[tokio::test]
    async fn test_create_routes_by_group() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{"kind":"BuildConfig","metadata":{"name":"app"}}"#;
        let origin = server
            .mock("POST", "/oapi/v1/namespaces/ci/buildconfigs")
            .match_body(body)
            .with_status(201)
            .create_async()
            .await;
        let core = server
            .mock("POST", "/api/v1/namespaces/ci/services")
            .with_status(201)
            .create_async()
            .await;

        let client = client_for(&server);
        client
            .create(ResourceGroup::Origin, "ci", "buildconfigs", body.as_bytes())
            .await
            .unwrap();
        client
            .create(ResourceGroup::Core, "ci", "services", b"{}")
            .await
            .unwrap();

        origin.assert_async().await;
        core.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_conflict_surfaces_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/namespaces/ci/services")
            .with_status(409)
            .with_body("services \"jenkins\" already exists")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .create(ResourceGroup::Core, "ci", "services", b"{}")
            .await
            .unwrap_err();

        match err {
            ClusterError::Api { status, message } => {
                assert_eq!(status, 409);
                assert!(message.contains("already exists"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_create_server_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let unavailable = server
            .mock("POST", "/api/v1/namespaces/ci/services")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;
        let conflict = server
            .mock("POST", "/api/v1/namespaces/ci/services")
            .with_status(409)
            .with_body("services \"jenkins\" already exists")
            .expect(0)
            .create_async()
            .await;

        let client = client_with_retries(&server, 1);
        let err = client
            .create(ResourceGroup::Core, "ci", "services", b"{}")
            .await
            .unwrap_err();

        assert!(matches!(err, ClusterError::Api { status: 503, .. }));
        unavailable.assert_async().await;
        conflict.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_rate_limit_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("POST", "/oapi/v1/namespaces/ci/routes")
            .with_status(429)
            .expect(1)
            .create_async()
            .await;
        let created = server
            .mock("POST", "/oapi/v1/namespaces/ci/routes")
            .with_status(201)
            .expect(1)
            .create_async()
            .await;

        let client = client_with_retries(&server, 1);
        client
            .create(ResourceGroup::Origin, "ci", "routes", b"{}")
            .await
            .unwrap();

        limited.assert_async().await;
        created.assert_async().await;
    }
}
