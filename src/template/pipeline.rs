use futures::stream::{self, StreamExt};
use log::{debug, info, warn};

use crate::cluster::types::ResourceGroup;
use crate::cluster::ClusterApi;
use crate::config::PipelineConfig;
use crate::error::{ClusterError, PipelineError};

use super::cancel::CancelSignal;
use super::mapping::{map_template_resources, ResourceMapping};
use super::outcome::Outcome;
use super::parameters::substitute_parameters;
use super::scheme::Scheme;

/// Kind the required service must have.
const SERVICE_KIND: &str = "Service";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Unprocessed,
    Processed,
    Instantiated,
}

/// A resource whose creation call succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedResource {
    pub index: usize,
    pub kind: String,
    pub name: String,
    pub group: ResourceGroup,
}

enum CreateAttempt {
    Created,
    Failed(ClusterError),
    Skipped,
}

/// One run of a pipeline template against a target namespace.
///
/// A run is processed once (fetch, substitute, expand, map) and then
/// instantiated once. Errors from both phases are accumulated rather than
/// returned individually; see [`PipelineTemplate::errors`].
pub struct PipelineTemplate<'c, C: ?Sized> {
    config: PipelineConfig,
    target_namespace: String,
    cluster: &'c C,
    scheme: Scheme,
    concurrency: usize,
    cancel: CancelSignal,
    state: RunState,
    items: Vec<ResourceMapping>,
    created: Vec<CreatedResource>,
    outcome: Outcome,
}

impl<'c, C> PipelineTemplate<'c, C>
where
    C: ClusterApi + ?Sized,
{
    pub fn new(config: PipelineConfig, target_namespace: impl Into<String>, cluster: &'c C) -> Self {
        Self {
            config,
            target_namespace: target_namespace.into(),
            cluster,
            scheme: Scheme::default(),
            concurrency: 1,
            cancel: CancelSignal::default(),
            state: RunState::Unprocessed,
            items: Vec::new(),
            created: Vec::new(),
            outcome: Outcome::default(),
        }
    }

    #[must_use]
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Maximum creation calls in flight. Results are still recorded in
    /// expansion order.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_cancel_signal(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn target_namespace(&self) -> &str {
        &self.target_namespace
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn items(&self) -> &[ResourceMapping] {
        &self.items
    }

    pub fn created(&self) -> &[CreatedResource] {
        &self.created
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Processing errors followed by creation errors.
    pub fn errors(&self) -> impl Iterator<Item = &PipelineError> {
        self.outcome.errors()
    }

    /// Fetches the template, applies the configured parameters, expands it in
    /// the target namespace and maps the result into resource descriptors.
    ///
    /// Only the first call does any work.
    pub async fn process(&mut self) -> &mut Self {
        if self.state != RunState::Unprocessed {
            return self;
        }
        self.state = RunState::Processed;

        let namespace = self.config.namespace.clone();
        let name = self.config.template_name.clone();

        info!("Fetching pipeline template {namespace}/{name}");
        let mut template = match self.cluster.get_template(&namespace, &name).await {
            Ok(template) => template,
            Err(err) if err.is_not_found() => {
                self.outcome
                    .record_process(PipelineError::TemplateNotFound { namespace, name });
                return self;
            }
            Err(source) => {
                self.outcome.record_process(PipelineError::FetchFailed {
                    namespace,
                    name,
                    source,
                });
                return self;
            }
        };

        let substitution_errors = substitute_parameters(&mut template, &self.config.parameters);
        info!(
            "Applied {} of {} template parameters",
            self.config.parameters.len() - substitution_errors.len(),
            self.config.parameters.len()
        );
        self.outcome.extend_process(substitution_errors);

        let objects = match self
            .cluster
            .process_template(&self.target_namespace, &template)
            .await
        {
            Ok(objects) => objects,
            Err(source) => {
                self.outcome.record_process(PipelineError::ProcessingFailed {
                    namespace,
                    name,
                    source,
                });
                return self;
            }
        };
        info!(
            "Expanded pipeline template {namespace}/{name} into {} objects",
            objects.len()
        );

        let (items, mapping_errors) = map_template_resources(&objects, &self.scheme);
        self.items = items;
        if !mapping_errors.is_empty() {
            warn!(
                "{} of {} expanded objects could not be mapped",
                mapping_errors.len(),
                objects.len()
            );
            self.outcome.extend_process(mapping_errors);
            return self;
        }

        info!("Processed pipeline template {namespace}/{name}");
        self
    }

    /// True when processing succeeded and the expansion contains a `Service`
    /// with the configured name.
    pub fn has_required_service(&self) -> bool {
        if !self.outcome.is_empty() {
            return false;
        }
        self.items
            .iter()
            .any(|item| item.name == self.config.service_name && item.kind == SERVICE_KIND)
    }

    fn missing_service(&self) -> PipelineError {
        PipelineError::MissingService {
            namespace: self.config.namespace.clone(),
            name: self.config.template_name.clone(),
            service: self.config.service_name.clone(),
        }
    }

    /// Creates every mapped resource in the target namespace.
    ///
    /// Refuses to start when any error has been recorded or the required
    /// service is missing. Individual creation failures do not stop the
    /// loop; they are recorded and summarized in the returned error. Nothing
    /// already created is rolled back.
    pub async fn instantiate(&mut self) -> Result<(), PipelineError> {
        match self.state {
            RunState::Unprocessed => return Err(PipelineError::NotProcessed),
            RunState::Instantiated => return Err(PipelineError::AlreadyInstantiated),
            RunState::Processed => {}
        }

        if !self.outcome.is_empty() {
            return Err(PipelineError::ProcessingErrors);
        }

        if !self.has_required_service() {
            let recorded = self.missing_service();
            self.outcome.record_create(recorded);
            return Err(self.missing_service());
        }

        self.state = RunState::Instantiated;
        let total = self.items.len();
        info!(
            "Creating {total} pipeline components in namespace {}",
            self.target_namespace
        );

        let cluster = self.cluster;
        let namespace = self.target_namespace.as_str();
        let cancel = &self.cancel;
        let attempts: Vec<CreateAttempt> = stream::iter(self.items.iter())
            .map(|item| async move {
                if cancel.is_cancelled() {
                    return CreateAttempt::Skipped;
                }
                debug!("Creating {}/{} ({})", item.kind, item.name, item.resource);
                match cluster
                    .create(item.group, namespace, &item.resource, &item.raw)
                    .await
                {
                    Ok(()) => CreateAttempt::Created,
                    Err(err) => CreateAttempt::Failed(err),
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut failed = 0;
        let mut skipped = 0;
        for (item, attempt) in self.items.iter().zip(attempts) {
            match attempt {
                CreateAttempt::Created => self.created.push(CreatedResource {
                    index: item.index,
                    kind: item.kind.clone(),
                    name: item.name.clone(),
                    group: item.group,
                }),
                CreateAttempt::Failed(source) => {
                    failed += 1;
                    warn!("Failed to create {}/{}: {source}", item.kind, item.name);
                    self.outcome.record_create(PipelineError::CreateFailed {
                        kind: item.kind.clone(),
                        name: item.name.clone(),
                        source,
                    });
                }
                CreateAttempt::Skipped => skipped += 1,
            }
        }

        let created = self.created.len();
        info!("Created {created} of {total} pipeline components");

        if skipped > 0 {
            warn!("Instantiation cancelled, {skipped} components were not attempted");
            self.outcome
                .record_create(PipelineError::Cancelled { created, total });
            return Err(PipelineError::Cancelled { created, total });
        }

        if failed > 0 {
            return Err(PipelineError::ComponentsFailed { failed, total });
        }

        Ok(())
    }
}
