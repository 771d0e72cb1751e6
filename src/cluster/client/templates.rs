use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::value::RawValue;

use super::core::{ClusterClient, RetryPolicy};
use crate::cluster::api::{TemplateProcessor, TemplateStore};
use crate::cluster::types::{ExpandedObject, Template};
use crate::error::Result;

/// Only the rendered objects are read back from a processed template.
#[derive(Deserialize)]
struct ProcessedTemplate {
    #[serde(default)]
    objects: Vec<Box<RawValue>>,
}

#[async_trait]
impl TemplateStore for ClusterClient {
    async fn get_template(&self, namespace: &str, name: &str) -> Result<Template> {
        let url = self.endpoint(&format!(
            "oapi/v1/namespaces/{namespace}/templates/{name}"
        ))?;
        debug!("GET {url}");

        let what = format!("template {namespace}/{name}");
        let response = self
            .execute(&what, RetryPolicy::Idempotent, || self.client.get(url.clone()))
            .await?;
        let body = response.bytes().await?;

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl TemplateProcessor for ClusterClient {
    async fn process_template(
        &self,
        namespace: &str,
        template: &Template,
    ) -> Result<Vec<ExpandedObject>> {
        let url = self.endpoint(&format!("oapi/v1/namespaces/{namespace}/processedtemplates"))?;
        let body = serde_json::to_vec(template)?;
        debug!("POST {url} ({} bytes)", body.len());

        let what = format!("namespace {namespace}");
        let response = self
            .execute(&what, RetryPolicy::Idempotent, || {
                self.client
                    .post(url.clone())
                    .header(CONTENT_TYPE, "application/json")
                    .body(body.clone())
            })
            .await?;
        let bytes = response.bytes().await?;
        let processed: ProcessedTemplate = serde_json::from_slice(&bytes)?;

        Ok(processed
            .objects
            .iter()
            .map(|object| ExpandedObject::from_raw_value(object))
            .collect())
    }
}
