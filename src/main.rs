use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use prism::config::AppConfig;
use prism::datasource::{self, DataSourceKind};
use prism::executor::{CodeExecutor, ExecutorKind, Scope};
use prism::server;

#[derive(Parser)]
#[command(name = "prism")]
#[command(version, about = "Data-insight platform back-end")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run a script file through an executor and print the JSON result
    Exec {
        /// Executor kind: local, sandbox (legacy: js-local, js-vm2)
        #[arg(long, default_value = "sandbox")]
        executor: String,
        /// Path to the script file
        file: PathBuf,
    },
    /// Probe a data source and exit 0 on success, 1 on failure
    TestDataSource {
        /// Data-source kind: mysql or postgres
        kind: String,
        /// Connection descriptor: <host>:<port>/<database>
        descriptor: String,
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "prism=debug" } else { "prism=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    match cli.command {
        Commands::Serve { port } => {
            let mut config = AppConfig::from_env().context("Failed to load configuration")?;
            if let Some(port) = port {
                config.port = port;
            }
            server::start_server(config).await
        }
        Commands::Exec { executor, file } => {
            let kind: ExecutorKind = executor.parse()?;
            let code = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read script file {}", file.display()))?;
            let mut context = Scope::new();
            let result = kind.build().execute(&code, &mut context).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Commands::TestDataSource { kind, descriptor, username, password } => {
            let kind: DataSourceKind = serde_json::from_value(serde_json::Value::String(kind))
                .context("Unknown data-source kind (expected mysql or postgres)")?;
            let success = datasource::probe(kind, &descriptor, &username, &password).await;
            if success {
                println!("Connection succeeded");
                Ok(())
            } else {
                println!("Connection failed");
                std::process::exit(1);
            }
        }
    }
}
