//! In-memory cluster used by the pipeline tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::cluster::api::{ResourceCreator, TemplateProcessor, TemplateStore};
use crate::cluster::types::{ExpandedObject, ResourceGroup, Template};
use crate::error::{ClusterError, Result};

use super::cancel::CancelSignal;

#[derive(Debug, Clone)]
pub struct CreateCall {
    pub group: ResourceGroup,
    pub namespace: String,
    pub resource: String,
    pub body: Vec<u8>,
}

pub struct FakeCluster {
    template: std::result::Result<Template, u16>,
    expansion: std::result::Result<Vec<ExpandedObject>, u16>,
    failing: HashSet<String>,
    cancel_after: Option<(usize, CancelSignal)>,
    processed: Mutex<Vec<Template>>,
    creates: Mutex<Vec<CreateCall>>,
}

impl FakeCluster {
    pub fn new(template: Template) -> Self {
        Self {
            template: Ok(template),
            expansion: Ok(Vec::new()),
            failing: HashSet::new(),
            cancel_after: None,
            processed: Mutex::new(Vec::new()),
            creates: Mutex::new(Vec::new()),
        }
    }

    pub fn missing_template() -> Self {
        Self {
            template: Err(404),
            ..Self::new(Template::new("", ""))
        }
    }

    pub fn unreachable_store() -> Self {
        Self {
            template: Err(403),
            ..Self::new(Template::new("", ""))
        }
    }

    pub fn with_expansion(mut self, objects: Vec<ExpandedObject>) -> Self {
        self.expansion = Ok(objects);
        self
    }

    pub fn with_expansion_failure(mut self, status: u16) -> Self {
        self.expansion = Err(status);
        self
    }

    /// Creation calls for `resource` fail with a server error.
    pub fn fail_creating(mut self, resource: &str) -> Self {
        self.failing.insert(resource.to_string());
        self
    }

    /// Trips `signal` once `count` creation calls have been made.
    pub fn cancel_after_creates(mut self, count: usize, signal: CancelSignal) -> Self {
        self.cancel_after = Some((count, signal));
        self
    }

    pub fn processed_templates(&self) -> Vec<Template> {
        self.processed.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> Vec<CreateCall> {
        self.creates.lock().unwrap().clone()
    }
}

fn api_error(status: u16) -> ClusterError {
    ClusterError::Api {
        status,
        message: format!("fake cluster returned {status}"),
    }
}

#[async_trait]
impl TemplateStore for FakeCluster {
    async fn get_template(&self, namespace: &str, name: &str) -> Result<Template> {
        match &self.template {
            Ok(template) => Ok(template.clone()),
            Err(404) => Err(ClusterError::NotFound(format!("template {namespace}/{name}"))),
            Err(status) => Err(api_error(*status)),
        }
    }
}

#[async_trait]
impl TemplateProcessor for FakeCluster {
    async fn process_template(
        &self,
        _namespace: &str,
        template: &Template,
    ) -> Result<Vec<ExpandedObject>> {
        self.processed.lock().unwrap().push(template.clone());
        match &self.expansion {
            Ok(objects) => Ok(objects.clone()),
            Err(status) => Err(api_error(*status)),
        }
    }
}

#[async_trait]
impl ResourceCreator for FakeCluster {
    async fn create(
        &self,
        group: ResourceGroup,
        namespace: &str,
        resource: &str,
        body: &[u8],
    ) -> Result<()> {
        let count = {
            let mut creates = self.creates.lock().unwrap();
            creates.push(CreateCall {
                group,
                namespace: namespace.to_string(),
                resource: resource.to_string(),
                body: body.to_vec(),
            });
            creates.len()
        };

        if let Some((limit, signal)) = &self.cancel_after {
            if count >= *limit {
                signal.cancel();
            }
        }

        if self.failing.contains(resource) {
            return Err(api_error(500));
        }
        Ok(())
    }
}
