use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cluster::ClientOptions;
use crate::template::Scheme;

const CONFIG_STEM: &str = "pipeline-template";

/// Configuration file structure.
///
/// Lets users keep cluster coordinates, template defaults and parameter
/// values in a file instead of repeating them as flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Cluster API connection settings
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Which template to instantiate and which service it must provide
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Resource kind tables
    #[serde(default)]
    pub scheme: SchemeConfig,

    /// Creation loop tuning
    #[serde(default)]
    pub instantiate: InstantiateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterConfig {
    /// API server URL (e.g., 'https://127.0.0.1:8443')
    pub server: Option<String>,

    /// Bearer token
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,

    /// Retries for network errors, rate limits and server errors
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between retries in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
}

/// Identifies the template to instantiate and the service it must contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PipelineConfig {
    /// Namespace the template is read from
    #[serde(default = "default_template_namespace")]
    pub namespace: String,

    /// Template name
    #[serde(default = "default_template_name")]
    pub template_name: String,

    /// Service that must be part of the expanded template
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Template parameter values
    #[serde(default)]
    pub parameters: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SchemeConfig {
    /// Replaces the built-in table of kinds served by the platform API group
    pub origin_kinds: Option<Vec<String>>,

    /// Additional kinds served by the base API
    #[serde(default)]
    pub core_kinds: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InstantiateConfig {
    /// Maximum creation calls in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Stop starting new creation calls after this many seconds
    pub timeout_secs: Option<u64>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            server: None,
            token: None,
            timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay(),
            insecure_skip_tls_verify: false,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            namespace: default_template_namespace(),
            template_name: default_template_name(),
            service_name: default_service_name(),
            parameters: IndexMap::new(),
        }
    }
}

impl Default for InstantiateConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: None,
        }
    }
}

fn default_template_namespace() -> String {
    "openshift".to_string()
}

fn default_template_name() -> String {
    "jenkins-ephemeral".to_string()
}

fn default_service_name() -> String {
    "jenkins".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    2
}

fn default_concurrency() -> usize {
    1
}

impl ClusterConfig {
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            insecure_skip_tls_verify: self.insecure_skip_tls_verify,
        }
    }
}

impl SchemeConfig {
    pub fn build(&self) -> Scheme {
        let scheme = Scheme::default().with_core_kinds(self.core_kinds.iter().cloned());
        match &self.origin_kinds {
            Some(kinds) => scheme.with_origin_kinds(kinds.iter().cloned()),
            None => scheme,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./pipeline-template.toml
    /// 3. ./pipeline-template.json
    /// 4. ./pipeline-template.yaml
    /// 5. ./pipeline-template.yml
    /// 6. `<user config dir>/pipeline-template/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        if let Some(found) = Self::discover(Path::new(".")) {
            return Self::load_from_path(&found);
        }

        if let Some(user_config) = dirs::config_dir().map(|dir| dir.join(CONFIG_STEM).join("config.toml")) {
            if user_config.exists() {
                return Self::load_from_path(&user_config);
            }
        }

        // No config file found, return defaults
        Ok(Self::default())
    }

    /// Finds the first candidate configuration file in `dir`.
    fn discover(dir: &Path) -> Option<PathBuf> {
        ["toml", "json", "yaml", "yml"]
            .iter()
            .map(|ext| dir.join(format!("{CONFIG_STEM}.{ext}")))
            .find(|candidate| candidate.exists())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension {
            "toml" => {
                toml::from_str(&contents)
                    .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
            }
            "json" => {
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
            }
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents)
                    .with_context(|| format!("Failed to parse YAML config: {}", path.display()))
            }
            _ => {
                // Try TOML first, then JSON, then YAML
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)?,
            _ => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::types::ResourceGroup;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pipeline.namespace, "openshift");
        assert_eq!(config.pipeline.template_name, "jenkins-ephemeral");
        assert_eq!(config.pipeline.service_name, "jenkins");
        assert!(config.pipeline.parameters.is_empty());
        assert_eq!(config.cluster.timeout_secs, 30);
        assert_eq!(config.instantiate.concurrency, 1);
        assert!(config.instantiate.timeout_secs.is_none());
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[cluster]
server = "https://api.example.com:6443"
token = "sha256~test-token"
max-retries = 1

[pipeline]
namespace = "ci-templates"
template-name = "jenkins-persistent"

[pipeline.parameters]
MEMORY_LIMIT = "1Gi"
VOLUME_CAPACITY = "5Gi"

[instantiate]
concurrency = 4
timeout-secs = 120
"#;
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.cluster.server.as_deref(), Some("https://api.example.com:6443"));
        assert_eq!(config.cluster.token.as_deref(), Some("sha256~test-token"));
        assert_eq!(config.cluster.max_retries, 1);
        assert_eq!(config.pipeline.namespace, "ci-templates");
        assert_eq!(config.pipeline.template_name, "jenkins-persistent");
        assert_eq!(config.pipeline.service_name, "jenkins");
        let params: Vec<_> = config.pipeline.parameters.keys().collect();
        assert_eq!(params, vec!["MEMORY_LIMIT", "VOLUME_CAPACITY"]);
        assert_eq!(config.instantiate.concurrency, 4);
        assert_eq!(config.instantiate.timeout_secs, Some(120));
    }

    #[test]
    fn test_load_json_config() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        let json_content = r#"{
  "pipeline": {
    "service-name": "ci-jenkins",
    "parameters": {"JENKINS_SERVICE_NAME": "ci-jenkins"}
  },
  "scheme": {
    "origin-kinds": ["BuildConfig"]
  }
}"#;
        write!(temp_file, "{}", json_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.pipeline.service_name, "ci-jenkins");
        assert_eq!(config.pipeline.parameters["JENKINS_SERVICE_NAME"], "ci-jenkins");

        let scheme = config.scheme.build();
        assert_eq!(scheme.group_of("BuildConfig"), ResourceGroup::Origin);
        assert_eq!(scheme.group_of("DeploymentConfig"), ResourceGroup::Core);
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        let yaml_content = "cluster:\n  insecure-skip-tls-verify: true\nscheme:\n  core-kinds: [HorizontalPodAutoscaler]\n";
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert!(config.cluster.insecure_skip_tls_verify);
        assert!(config.scheme.build().is_registered("HorizontalPodAutoscaler"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let result = Config::load(Some(Path::new("does-not-exist.toml")));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to read config file"));
    }

    #[test]
    fn test_discover_prefers_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("pipeline-template.yaml"), "{}").unwrap();
        std::fs::write(temp_dir.path().join("pipeline-template.toml"), "").unwrap();

        let found = Config::discover(temp_dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "pipeline-template.toml");

        let empty_dir = tempfile::tempdir().unwrap();
        assert!(Config::discover(empty_dir.path()).is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("saved.toml");

        let mut config = Config::default();
        config.cluster.server = Some("https://127.0.0.1:8443".to_string());
        config
            .pipeline
            .parameters
            .insert("IMAGE_TAG".to_string(), "v2".to_string());
        config.save(&path).unwrap();

        let reloaded = Config::load(Some(&path)).unwrap();
        assert_eq!(reloaded.cluster.server, config.cluster.server);
        assert_eq!(reloaded.pipeline, config.pipeline);
    }

    #[test]
    fn test_client_options_from_cluster_config() {
        let cluster = ClusterConfig {
            timeout_secs: 7,
            retry_delay_secs: 3,
            ..ClusterConfig::default()
        };
        let options = cluster.client_options();
        assert_eq!(options.timeout, Duration::from_secs(7));
        assert_eq!(options.retry_delay, Duration::from_secs(3));
        assert_eq!(options.max_retries, 5);
    }
}
