mod agent;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use hail_a2a::server::A2aServer;
use hail_core::config::{AgentRole, Config, EngineMode, resolve_config_path};
use hail_core::form::FormRegistry;
use hail_core::session::SessionStore;
use tokio::sync::watch;

#[derive(Debug, Parser)]
#[command(name = "hail", version, about = "Greeter and Caller agents speaking over HTTP")]
struct Cli {
    /// Config file. Defaults to `$HAIL_CONFIG`, then `config/<role>.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the Greeter agent.
    Greeter(ServeArgs),
    /// Serve the Caller agent, which relays greeting requests to a Greeter.
    Caller(ServeArgs),
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Engine backing the agent: `pattern` or `oracle`.
    #[arg(long)]
    mode: Option<EngineMode>,

    #[arg(long)]
    port: Option<u16>,
}

impl Command {
    fn role(&self) -> AgentRole {
        match self {
            Self::Greeter(_) => AgentRole::Greeter,
            Self::Caller(_) => AgentRole::Caller,
        }
    }

    fn args(&self) -> &ServeArgs {
        match self {
            Self::Greeter(args) | Self::Caller(args) => args,
        }
    }
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let role = cli.command.role();
    let path = resolve_config_path(cli.config.as_deref(), role);
    let mut config = Config::load(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;

    config.agent.role = role;
    let args = cli.command.args();
    if let Some(mode) = args.mode {
        config.agent.mode = mode;
    }
    if let Some(port) = args.port {
        config.server.port = Some(port);
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    tracing::info!(
        role = %config.agent.role,
        mode = %config.agent.mode,
        "starting {}",
        config.agent_name()
    );

    let sessions = SessionStore::new();
    let forms = FormRegistry::new();
    let engine = agent::build_engine(&config, &sessions, &forms)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let form_sweeper = (config.agent.role == AgentRole::Greeter && config.forms.ttl_secs > 0)
        .then(|| {
            tracing::info!(ttl_secs = config.forms.ttl_secs, "form expiry enabled");
            forms.spawn_expiry_sweeper(
                Duration::from_secs(config.forms.ttl_secs),
                shutdown_rx.clone(),
            )
        });
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    A2aServer::new(
        agent::card(&config),
        engine,
        agent::health_for(&config),
        &config.server.host,
        config.port(),
        shutdown_rx,
    )
    .with_max_body_size(config.server.max_body_size)
    .with_idle_sweep(
        sessions,
        Duration::from_secs(config.sessions.idle_timeout_secs),
    )
    .serve()
    .await
    .context("agent server failed")?;

    if let Some(handle) = form_sweeper {
        handle.abort();
    }
    Ok(())
}
