use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::Token;
use crate::cluster::ClusterClient;
use crate::config::Config;
use crate::output::{print_summary, PhaseProgress};
use crate::report::RunReport;
use crate::template::{parse_assignment, CancelSignal, PipelineTemplate};

#[derive(Parser)]
#[command(name = "pipeline-template")]
#[command(author, version, about = "Pipeline Template Instantiator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (toml, json or yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, substitute, expand and map the template without creating anything
    Process(RunArgs),
    /// Process the template and create its resources in the target namespace
    Instantiate(RunArgs),
    /// Write a configuration file populated with the defaults
    InitConfig {
        /// Destination, format picked by extension
        #[arg(default_value = "pipeline-template.toml")]
        path: PathBuf,

        #[arg(short, long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Namespace the pipeline is instantiated into
    #[arg(short, long)]
    namespace: String,

    #[arg(short, long, env = "CLUSTER_SERVER")]
    server: Option<String>,

    #[arg(short, long, env = "CLUSTER_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Namespace holding the pipeline template
    #[arg(long)]
    template_namespace: Option<String>,

    #[arg(long)]
    template: Option<String>,

    /// Service the expanded template must contain
    #[arg(long)]
    service: Option<String>,

    /// Template parameter override, may be repeated
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    params: Vec<(String, String)>,

    #[arg(long)]
    concurrency: Option<usize>,

    /// Stop creating resources after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[arg(long, default_value_t = false)]
    insecure_skip_tls_verify: bool,
}

impl RunArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(server) = &self.server {
            config.cluster.server = Some(server.clone());
        }
        if let Some(token) = &self.token {
            config.cluster.token = Some(token.clone());
        }
        if self.insecure_skip_tls_verify {
            config.cluster.insecure_skip_tls_verify = true;
        }
        if let Some(namespace) = &self.template_namespace {
            config.pipeline.namespace = namespace.clone();
        }
        if let Some(template) = &self.template {
            config.pipeline.template_name = template.clone();
        }
        if let Some(service) = &self.service {
            config.pipeline.service_name = service.clone();
        }
        for (name, value) in &self.params {
            config.pipeline.parameters.insert(name.clone(), value.clone());
        }
        if let Some(concurrency) = self.concurrency {
            config.instantiate.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout_secs {
            config.instantiate.timeout_secs = Some(timeout);
        }
    }
}

impl Cli {
    fn load_config(&self, args: &RunArgs) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        args.apply(&mut config);
        Ok(config)
    }

    fn connect(config: &Config) -> Result<ClusterClient> {
        let Some(server) = config.cluster.server.as_deref() else {
            bail!("no cluster server configured, pass --server or set CLUSTER_SERVER");
        };
        let token = config.cluster.token.as_deref().map(Token::from);
        if token.is_none() {
            warn!("No cluster token configured, requests will be unauthenticated");
        }

        ClusterClient::new(server, token, config.cluster.client_options())
            .with_context(|| format!("invalid cluster server {server}"))
    }

    fn cancel_signal(config: &Config) -> CancelSignal {
        let cancel = match config.instantiate.timeout_secs {
            Some(secs) => CancelSignal::with_timeout(Duration::from_secs(secs)),
            None => CancelSignal::new(),
        };

        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, no further resources will be created");
                on_interrupt.cancel();
            }
        });

        cancel
    }

    async fn execute_run(&self, args: &RunArgs, dry_run: bool) -> Result<()> {
        let config = self.load_config(args)?;
        let client = Self::connect(&config)?;

        info!(
            "{} template {}/{} into namespace {}",
            if dry_run { "Processing" } else { "Instantiating" },
            config.pipeline.namespace,
            config.pipeline.template_name,
            args.namespace
        );

        let template = format!(
            "{}/{}",
            config.pipeline.namespace, config.pipeline.template_name
        );
        let mut run = PipelineTemplate::new(config.pipeline.clone(), &args.namespace, &client)
            .with_scheme(config.scheme.build())
            .with_concurrency(config.instantiate.concurrency);

        let progress = PhaseProgress::start_processing(&template);
        run.process().await;
        let processed_ok = run.errors().next().is_none();

        if dry_run || !processed_ok {
            progress.finish_processing(run.items().len(), processed_ok);
        } else {
            let progress = progress.finish_processing_start_creation(run.items().len());
            run = run.with_cancel_signal(Self::cancel_signal(&config));
            if let Err(err) = run.instantiate().await {
                warn!("{err}");
            }
            progress.finish_creation(run.created().len(), run.items().len());
        }

        let report = RunReport::from_run(&run, dry_run);
        self.write_report(&report)?;
        print_summary(&report);

        if !report.succeeded {
            bail!("pipeline template {template} could not be instantiated into {}", args.namespace);
        }
        Ok(())
    }

    fn write_report(&self, report: &RunReport) -> Result<()> {
        let json_output = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Report written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }

    fn init_config(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!("{} already exists, pass --force to overwrite it", path.display());
        }
        Config::default().save(path)?;
        info!("Configuration written to: {}", path.display());
        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Process(args) => self.execute_run(args, true).await,
            Commands::Instantiate(args) => self.execute_run(args, false).await,
            Commands::InitConfig { path, force } => Self::init_config(path, *force),
        }
    }
}
