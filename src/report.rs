use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cluster::types::ResourceGroup;
use crate::cluster::ClusterApi;
use crate::error::{ErrorClass, PipelineError};
use crate::template::{PipelineTemplate, RunState};

/// Machine-readable result of a pipeline run.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub template: String,
    pub target_namespace: String,
    pub required_service: String,
    pub collected_at: DateTime<Utc>,
    pub dry_run: bool,
    pub succeeded: bool,
    pub total_resources: usize,
    pub created_resources: usize,
    pub resources: Vec<ResourceReport>,
    pub errors: Vec<ErrorReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceReport {
    pub index: usize,
    pub kind: String,
    pub name: String,
    pub resource: String,
    pub group: ResourceGroup,
    pub created: bool,
    pub failed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub class: ErrorClass,
    pub message: String,
}

impl RunReport {
    pub fn from_run<C: ClusterApi + ?Sized>(run: &PipelineTemplate<'_, C>, dry_run: bool) -> Self {
        let config = run.config();
        let created = run.created();
        let failed = |kind: &str, name: &str| {
            run.outcome().create_errors().iter().any(|err| {
                matches!(err, PipelineError::CreateFailed { kind: k, name: n, .. } if k == kind && n == name)
            })
        };

        let resources: Vec<ResourceReport> = run
            .items()
            .iter()
            .map(|item| ResourceReport {
                index: item.index,
                kind: item.kind.clone(),
                name: item.name.clone(),
                resource: item.resource.clone(),
                group: item.group,
                created: created.iter().any(|c| c.index == item.index),
                failed: failed(&item.kind, &item.name),
            })
            .collect();

        let errors: Vec<ErrorReport> = run
            .errors()
            .map(|err| ErrorReport {
                class: err.class(),
                message: err.to_string(),
            })
            .collect();

        let succeeded = errors.is_empty()
            && if dry_run {
                run.has_required_service()
            } else {
                run.state() == RunState::Instantiated
            };

        Self {
            template: format!("{}/{}", config.namespace, config.template_name),
            target_namespace: run.target_namespace().to_string(),
            required_service: config.service_name.clone(),
            collected_at: Utc::now(),
            dry_run,
            succeeded,
            total_resources: resources.len(),
            created_resources: created.len(),
            resources,
            errors,
        }
    }
}
