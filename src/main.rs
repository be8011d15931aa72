// src/main.rs
use clap::{Parser, Subcommand};
use kubegate::{
    auth::{AuthenticationGateway, ClusterEndpointResolver, HostAllowlist},
    config::GatewayConfig,
    kubeconfig, utils,
    web::{self, WebServerState},
};
use std::{fs, io, path::PathBuf, sync::Arc};
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(short, long, default_value = "gateway_config.json")]
    pub config: String,
    #[arg(short, long)]
    pub debug: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the HTTP API
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
        /// Accept POST /api/allowlist to extend trust at runtime
        #[arg(long)]
        allow_runtime_additions: bool,
    },
    /// Authenticate a kubeconfig file against a namespace once
    Check {
        #[arg(short, long)]
        namespace: String,
        #[arg(short, long)]
        kubeconfig: PathBuf,
    },
    /// Print the active server and user of a kubeconfig file
    Inspect {
        #[arg(short, long)]
        kubeconfig: PathBuf,
    },
    /// Print the in-cluster API server URL derived from the environment
    CanonicalHost,
}

fn build_gateway(config: &GatewayConfig) -> AuthenticationGateway {
    AuthenticationGateway::new(
        HostAllowlist::with_hosts(config.allowed_hosts.iter().cloned()),
        ClusterEndpointResolver::from_process_env(),
        config.probe_settings(),
        config.probe_timeout(),
    )
}

async fn serve(config: GatewayConfig, port: Option<u16>, allow_runtime_additions: bool) -> io::Result<()> {
    let gateway = build_gateway(&config);
    if gateway.canonical_host().is_empty() {
        warn!("KUBERNETES_SERVICE_HOST/PORT not set, only allowlisted hosts are trusted");
    }

    let mut state = WebServerState::new(gateway, port.or(Some(config.port)));
    state.allow_runtime_additions = allow_runtime_additions;

    // Create shutdown channel and stop on Ctrl-C
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
        }
        let _ = shutdown_tx.send(());
    });

    web::start_web_server(Arc::new(state), shutdown_rx).await
}

#[tokio::main]
async fn main() -> io::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    let config = GatewayConfig::load_or_default(&args.config)?;
    utils::logging::init_logging(config.log_file.as_deref(), args.debug)?;

    match args.command {
        Command::Serve {
            port,
            allow_runtime_additions,
        } => serve(config, port, allow_runtime_additions).await,
        Command::Check {
            namespace,
            kubeconfig: path,
        } => {
            let document = fs::read_to_string(&path)?;
            let accepted = build_gateway(&config)
                .authenticate(&namespace, &document)
                .await?;
            println!(
                "accepted: user {} may access namespace {} on {}",
                accepted.user, accepted.namespace, accepted.host
            );
            Ok(())
        }
        Command::Inspect { kubeconfig: path } => {
            let document = fs::read_to_string(&path)?;
            let active = kubeconfig::resolve_active_context(&document)?;
            println!("context: {}", active.context);
            println!("server:  {}", active.server);
            println!("user:    {}", active.user);
            if let Some(namespace) = active.namespace {
                println!("namespace: {}", namespace);
            }
            Ok(())
        }
        Command::CanonicalHost => {
            println!("{}", kubegate::canonical_host_from_environment());
            Ok(())
        }
    }
}
