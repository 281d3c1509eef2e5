#![deny(unsafe_code)]

//! Softshell CLI — inspect context-filter decisions and the model catalog.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

use softshell_config::AppConfig;
use softshell_core::api::ApiClient;
use softshell_core::auth::AuthStatus;
use softshell_core::filters::ContextFiltersProvider;
use softshell_core::models::{self, ModelUsage, ModelsService};
use softshell_core::repo::{GitRemoteResolver, RepoNameResolver, ServerRepoNameResolver};
use softshell_core::storage::JsonFileStorage;

/// Softshell — context-filter and model-catalog engine for the assistant client.
#[derive(Parser)]
#[command(name = "softshell", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "softshell.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a local file may be used as context.
    Check {
        /// File path to check.
        path: PathBuf,
    },

    /// Decide whether a repository name is ignored by the policy.
    Repo {
        /// Repository name, e.g. "github.com/softshell/softshell".
        name: String,
    },

    /// Inspect the model catalog.
    Models {
        #[command(subcommand)]
        command: ModelsCommands,
    },

    /// Show version, endpoint, and account status.
    Status,

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
enum ModelsCommands {
    /// List the models available to this account.
    List,

    /// Show the default model for each usage.
    Default,

    /// Select a model as the default for a usage.
    Select {
        /// Usage to select for: "chat", "edit", or "autocomplete".
        usage: String,

        /// Model id, e.g. "anthropic/claude-3-opus-20240229".
        model: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up tracing subscriber with verbosity level
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match cli.command {
        Commands::Check { path } => cmd_check(&cli.config, &path).await?,
        Commands::Repo { name } => cmd_repo(&cli.config, &name).await?,
        Commands::Models { command } => cmd_models(&cli.config, command).await?,
        Commands::Status => cmd_status(&cli.config).await?,
        Commands::Config { show } => cmd_config(&cli.config, show).await?,
    }

    Ok(())
}

/// The assembled engine: every collaborator wired up per the configuration.
struct Engine {
    provider: Arc<ContextFiltersProvider>,
    models: ModelsService,
}

async fn build_engine(config: &AppConfig) -> Result<Engine> {
    let token = config.connection.access_token();
    let auth = AuthStatus::from_config(config, token.is_some());

    let client = Arc::new(
        ApiClient::new(&config.connection.endpoint, token)
            .with_timeout(Duration::from_secs(config.connection.request_timeout_secs)),
    );

    // Enterprise servers know their repos by clone URL; the hosted service
    // relies on local git metadata.
    let resolver: Arc<dyn RepoNameResolver> = if auth.is_enterprise_user() {
        Arc::new(ServerRepoNameResolver::new(Arc::clone(&client)))
    } else {
        Arc::new(GitRemoteResolver)
    };

    let fetcher: Arc<dyn softshell_core::filters::PolicyFetcher> = client.clone();
    let provider = ContextFiltersProvider::new(fetcher, resolver);
    let (_auth_tx, auth_rx) = watch::channel(auth.clone());
    provider.start(auth_rx).await;

    let storage = Arc::new(
        JsonFileStorage::open(&config.storage.preferences_path)
            .await
            .context("opening preferences storage")?,
    );
    let mut service = ModelsService::new(storage);
    service.set_auth_status(auth.clone());

    if auth.is_enterprise_user() {
        match client.fetch_server_models().await {
            Ok(server_config) => service.set_server_sent_models(&server_config).await,
            Err(error) => warn!(%error, "could not fetch server model configuration"),
        }
    } else {
        service.set_models(models::dotcom::default_models());
    }

    Ok(Engine {
        provider,
        models: service,
    })
}

async fn cmd_check(config_path: &Path, path: &Path) -> Result<()> {
    let config = load_config(config_path).await?;
    let engine = build_engine(&config).await?;

    let absolute = std::path::absolute(path)
        .with_context(|| format!("resolving path '{}'", path.display()))?;
    let uri = Url::from_file_path(&absolute)
        .map_err(|_| anyhow!("not a valid file path: '{}'", absolute.display()))?;

    let verdict = engine
        .provider
        .is_uri_ignored(&uri, &CancellationToken::new())
        .await;
    if verdict.is_ignored() {
        println!("{}: ignored ({verdict})", path.display());
        std::process::exit(1);
    }
    println!("{}: allowed", path.display());
    Ok(())
}

async fn cmd_repo(config_path: &Path, name: &str) -> Result<()> {
    let config = load_config(config_path).await?;
    let engine = build_engine(&config).await?;

    if engine.provider.is_repo_name_ignored(name) {
        println!("{name}: ignored");
        std::process::exit(1);
    }
    println!("{name}: allowed");
    Ok(())
}

async fn cmd_models(config_path: &Path, command: ModelsCommands) -> Result<()> {
    let config = load_config(config_path).await?;
    let mut engine = build_engine(&config).await?;

    match command {
        ModelsCommands::List => {
            for model in engine.models.get_models() {
                let marker = if engine.models.is_model_available(&model.id) {
                    ' '
                } else {
                    '*'
                };
                println!("{marker} {}  ({})", model.id, model.title);
            }
            println!("\n(* = not available on the current plan)");
        }
        ModelsCommands::Default => {
            for usage in [ModelUsage::Chat, ModelUsage::Edit, ModelUsage::Autocomplete] {
                match engine.models.get_default_model(usage) {
                    Some(model) => println!("{usage}: {}", model.id),
                    None => println!("{usage}: (none)"),
                }
            }
        }
        ModelsCommands::Select { usage, model } => {
            let usage = parse_usage(&usage)?;
            engine.models.set_selected_model(usage, &model).await?;
            match engine.models.get_default_model(usage) {
                Some(resolved) => println!("{usage} default is now {}", resolved.id),
                None => println!("{usage} default is unset"),
            }
        }
    }
    Ok(())
}

async fn cmd_status(config_path: &Path) -> Result<()> {
    let config = load_config(config_path).await?;
    let token = config.connection.access_token();
    let auth = AuthStatus::from_config(&config, token.is_some());

    println!("{}", softshell_core::build_info::version_string());
    println!("endpoint:      {}", auth.endpoint);
    println!("plan:          {}", config.account.plan);
    if !auth.username.is_empty() {
        println!("username:      {}", auth.username);
    }
    println!(
        "authenticated: {}",
        if auth.authenticated { "yes" } else { "no" }
    );
    Ok(())
}

async fn cmd_config(config_path: &Path, show: bool) -> Result<()> {
    let config = load_config(config_path).await?;
    if show {
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| anyhow!("TOML error: {e}"))?;
        println!("{toml_str}");
    } else {
        println!("Configuration at '{}' is valid.", config_path.display());
    }
    Ok(())
}

fn parse_usage(s: &str) -> Result<ModelUsage> {
    match s {
        "chat" => Ok(ModelUsage::Chat),
        "edit" => Ok(ModelUsage::Edit),
        "autocomplete" => Ok(ModelUsage::Autocomplete),
        other => bail!("unknown usage '{other}' (expected chat, edit, or autocomplete)"),
    }
}

async fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        AppConfig::load(path).await.map_err(|e| anyhow!(e))
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(AppConfig::default())
    }
}
