use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised by the cluster API transport.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("API request failed (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("API request failed with status {status} after {retries} retries")]
    ApiErrorAfterRetries { status: u16, retries: u32 },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClusterError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::Api { status: 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, ClusterError>;

/// Broad category of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorClass {
    /// The caller's input is wrong (missing template, bad parameter, missing service).
    Configuration,
    /// A store, processor or creator call failed.
    Transport,
    /// An expanded object could not be turned into a resource descriptor.
    Mapping,
    Cancelled,
}

/// Errors recorded while processing and instantiating a pipeline template.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("pipeline template {namespace}/{name} not found")]
    TemplateNotFound { namespace: String, name: String },

    #[error("fetching pipeline template {namespace}/{name} failed: {source}")]
    FetchFailed {
        namespace: String,
        name: String,
        #[source]
        source: ClusterError,
    },

    #[error("template parameter name cannot be empty ({value:?})")]
    EmptyParameterName { value: String },

    #[error("unknown parameter {0:?} specified for template")]
    UnknownParameter(String),

    #[error("processing pipeline template {namespace}/{name} failed: {source}")]
    ProcessingFailed {
        namespace: String,
        name: String,
        #[source]
        source: ClusterError,
    },

    #[error("unable to convert {0} to unknown object")]
    NotRawObject(String),

    #[error("unable to decode {0:?}")]
    Decode(String),

    #[error("unknown kind {0}")]
    UnknownKind(String),

    #[error("unknown name {0}")]
    UnknownName(String),

    #[error("unable to instantiate pipeline, processing pipeline template failed")]
    ProcessingErrors,

    #[error("pipeline template has not been processed")]
    NotProcessed,

    #[error("pipeline template has already been instantiated")]
    AlreadyInstantiated,

    #[error("template {namespace}/{name} does not contain required service {service:?}")]
    MissingService {
        namespace: String,
        name: String,
        service: String,
    },

    #[error("creating pipeline component {kind}/{name} failed: {source}")]
    CreateFailed {
        kind: String,
        name: String,
        #[source]
        source: ClusterError,
    },

    #[error("{failed} of {total} pipeline components failed to create")]
    ComponentsFailed { failed: usize, total: usize },

    #[error("instantiation cancelled after creating {created} of {total} pipeline components")]
    Cancelled { created: usize, total: usize },
}

impl PipelineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::TemplateNotFound { .. }
            | Self::EmptyParameterName { .. }
            | Self::UnknownParameter(_)
            | Self::MissingService { .. }
            | Self::ProcessingErrors
            | Self::NotProcessed
            | Self::AlreadyInstantiated => ErrorClass::Configuration,
            Self::FetchFailed { .. }
            | Self::ProcessingFailed { .. }
            | Self::CreateFailed { .. }
            | Self::ComponentsFailed { .. } => ErrorClass::Transport,
            Self::NotRawObject(_)
            | Self::Decode(_)
            | Self::UnknownKind(_)
            | Self::UnknownName(_) => ErrorClass::Mapping,
            Self::Cancelled { .. } => ErrorClass::Cancelled,
        }
    }
}
