use async_trait::async_trait;

use crate::error::Result;

use super::types::{ExpandedObject, ResourceGroup, Template};

/// Read access to stored templates.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Fetches `name` from `namespace`. A missing template must surface as an
    /// error for which `ClusterError::is_not_found` is true.
    async fn get_template(&self, namespace: &str, name: &str) -> Result<Template>;
}

/// Server-side template expansion.
#[async_trait]
pub trait TemplateProcessor: Send + Sync {
    /// Expands `template` in `namespace`, returning the rendered objects in
    /// template order.
    async fn process_template(
        &self,
        namespace: &str,
        template: &Template,
    ) -> Result<Vec<ExpandedObject>>;
}

/// Creation endpoint for both API groups.
#[async_trait]
pub trait ResourceCreator: Send + Sync {
    async fn create(
        &self,
        group: ResourceGroup,
        namespace: &str,
        resource: &str,
        body: &[u8],
    ) -> Result<()>;
}

/// Everything a pipeline run needs from the cluster.
pub trait ClusterApi: TemplateStore + TemplateProcessor + ResourceCreator {}

impl<T> ClusterApi for T where T: TemplateStore + TemplateProcessor + ResourceCreator {}
