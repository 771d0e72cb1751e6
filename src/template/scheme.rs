use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;

use crate::cluster::types::{ObjectMeta, RawObject, ResourceGroup};
use crate::error::PipelineError;

/// Kinds served by the base orchestration API.
const CORE_KINDS: &[&str] = &[
    "ConfigMap",
    "Endpoints",
    "Event",
    "LimitRange",
    "Namespace",
    "PersistentVolumeClaim",
    "Pod",
    "PodTemplate",
    "ReplicationController",
    "ResourceQuota",
    "Secret",
    "Service",
    "ServiceAccount",
];

/// Kinds served by the platform API group.
const ORIGIN_KINDS: &[&str] = &[
    "Build",
    "BuildConfig",
    "ClusterRole",
    "ClusterRoleBinding",
    "DeploymentConfig",
    "EgressNetworkPolicy",
    "Group",
    "ImageStream",
    "ImageStreamImport",
    "ImageStreamTag",
    "OAuthClient",
    "Policy",
    "PolicyBinding",
    "Project",
    "Role",
    "RoleBinding",
    "Route",
    "Template",
    "User",
];

const UNPLURALIZED_SUFFIXES: &[&str] = &["endpoints"];

/// The minimal typed view of a decoded object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedObject {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: Option<ObjectMeta>,
}

impl fmt::Display for TypedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.metadata.as_ref().map_or("", |m| m.name.as_str());
        write!(
            f,
            "&{{apiVersion:{} kind:{} name:{}}}",
            self.api_version, self.kind, name
        )
    }
}

/// Registry of resource kinds known to the target cluster.
///
/// Decodes expanded objects, resolves their kind and name, and decides which
/// API group serves them.
#[derive(Debug, Clone)]
pub struct Scheme {
    core: HashSet<String>,
    origin: HashSet<String>,
}

impl Default for Scheme {
    fn default() -> Self {
        Self {
            core: CORE_KINDS.iter().map(ToString::to_string).collect(),
            origin: ORIGIN_KINDS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Scheme {
    /// Replaces the platform group table. Kinds dropped from it stay
    /// registered and fall back to the base API.
    #[must_use]
    pub fn with_origin_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let replaced = std::mem::take(&mut self.origin);
        self.origin = kinds.into_iter().map(Into::into).collect();
        self.core
            .extend(replaced.into_iter().filter(|k| !self.origin.contains(k)));
        self
    }

    /// Registers additional kinds served by the base API.
    #[must_use]
    pub fn with_core_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core.extend(kinds.into_iter().map(Into::into));
        self
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        self.core.contains(kind) || self.origin.contains(kind)
    }

    pub fn decode(&self, raw: &RawObject) -> Result<TypedObject, PipelineError> {
        serde_json::from_slice(&raw.raw)
            .map_err(|_| PipelineError::Decode(raw.as_str_lossy().into_owned()))
    }

    pub fn kind_of<'a>(&self, obj: &'a TypedObject) -> Result<&'a str, PipelineError> {
        if obj.kind.is_empty() || !self.is_registered(&obj.kind) {
            return Err(PipelineError::UnknownKind(obj.to_string()));
        }
        Ok(&obj.kind)
    }

    pub fn name_of<'a>(&self, obj: &'a TypedObject) -> Result<&'a str, PipelineError> {
        match &obj.metadata {
            Some(meta) if !meta.name.is_empty() => Ok(&meta.name),
            _ => Err(PipelineError::UnknownName(obj.to_string())),
        }
    }

    pub fn group_of(&self, kind: &str) -> ResourceGroup {
        if self.origin.contains(kind) {
            ResourceGroup::Origin
        } else {
            ResourceGroup::Core
        }
    }
}

/// Converts a kind into its REST resource name.
pub fn pluralize(kind: &str) -> String {
    let singular = kind.to_lowercase();
    if singular.is_empty() {
        return singular;
    }
    if UNPLURALIZED_SUFFIXES
        .iter()
        .any(|suffix| singular.ends_with(suffix))
    {
        return singular;
    }
    if singular.ends_with('s') {
        return format!("{singular}es");
    }
    if let Some(stem) = singular.strip_suffix('y') {
        return format!("{stem}ies");
    }
    format!("{singular}s")
}
