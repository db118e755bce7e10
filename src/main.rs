use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use trellis_config::CallSetDef;
use trellis_endpoint::{FsSecretStore, SecretEndpointResolver, UserInfo};
use trellis_expr::JqEvaluator;
use trellis_http::HttpTransport;
use trellis_orchestrator::{DEFAULT_AUTHN_NAMESPACE, Orchestrator, OrchestratorConfig, ResolveOptions};

/// Trellis - resolves declarative, dependency-linked API call sets
#[derive(Parser)]
#[command(name = "trellis")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.trellis)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve a call set and print the result dictionary
  Resolve(ResolveArgs),

  /// Print the order the calls of a call set run in
  Order {
    /// Path to the call set file (JSON)
    calls_file: PathBuf,
  },
}

#[derive(clap::Args)]
struct ResolveArgs {
  /// Path to the call set file (JSON)
  calls_file: PathBuf,

  /// Caller's username
  #[arg(long)]
  user: Option<String>,

  /// Caller's groups
  #[arg(long = "group")]
  groups: Vec<String>,

  /// Caller's bearer token
  #[arg(long, env = "TRELLIS_TOKEN", hide_env_values = true)]
  token: Option<String>,

  /// Namespace of per-user endpoints
  #[arg(long, default_value = DEFAULT_AUTHN_NAMESPACE)]
  namespace: String,

  #[arg(long, default_value_t = 0)]
  per_page: u64,

  #[arg(long, default_value_t = 0)]
  page: u64,

  /// Request timeout in seconds
  #[arg(long)]
  timeout: Option<u64>,

  /// Log every request
  #[arg(long)]
  verbose: bool,

  /// Render failed template expressions as their error text
  #[arg(long)]
  lenient: bool,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".trellis"),
  };

  match cli.command {
    Some(Commands::Resolve(args)) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(resolve(args, data_dir))?;
    }
    Some(Commands::Order { calls_file }) => {
      order(&calls_file)?;
    }
    None => {
      println!("trellis - use --help to see available commands");
    }
  }

  Ok(())
}

fn load_call_set(calls_file: &Path) -> Result<CallSetDef> {
  let content = std::fs::read_to_string(calls_file)
    .with_context(|| format!("failed to read call set file: {}", calls_file.display()))?;

  CallSetDef::from_json(&content)
    .with_context(|| format!("failed to parse call set file: {}", calls_file.display()))
}

fn order(calls_file: &Path) -> Result<()> {
  let call_set = load_call_set(calls_file)?;
  let order = trellis_graph::sort(&call_set.api).context("invalid call set")?;

  for name in order {
    println!("{}", name);
  }

  Ok(())
}

async fn resolve(args: ResolveArgs, data_dir: PathBuf) -> Result<()> {
  let call_set = load_call_set(&args.calls_file)?;

  eprintln!(
    "Loaded call set: {} ({} calls)",
    call_set.name.as_deref().unwrap_or("unnamed"),
    call_set.api.len()
  );

  let config = OrchestratorConfig {
    authn_namespace: args.namespace,
    lenient_templates: args.lenient,
    ..Default::default()
  };

  let store = FsSecretStore::new(data_dir.join("secrets"));
  let transport = match args.timeout {
    Some(secs) => HttpTransport::with_timeout(Duration::from_secs(secs)),
    None => HttpTransport::new(),
  };

  let orchestrator = Orchestrator::new(
    config,
    Arc::new(JqEvaluator::new()),
    Arc::new(SecretEndpointResolver::new(store)),
    Arc::new(transport),
  );

  let options = ResolveOptions {
    items: call_set.api,
    authn_namespace: None,
    user: args.user.map(|username| UserInfo::new(username, args.groups)),
    access_token: args.token,
    verbose: args.verbose,
    per_page: args.per_page,
    page: args.page,
    filter: call_set.filter,
  };

  // Cancel in-flight calls on Ctrl-C
  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      on_interrupt.cancel();
    }
  });

  let result = orchestrator
    .resolve(options, cancel)
    .await
    .context("call set resolution failed")?;

  println!("{}", serde_json::to_string_pretty(&result)?);

  Ok(())
}
