use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use scigateway::config::{load_config, print_schema};
use scigateway::startup::{build_gateway, configure_site};
use scigateway::state::{intents, reducer::summary, AuthStatus};
use scigateway::utils::logger::init_logging;

#[derive(Parser, Debug)]
#[command(name = "scigateway", version, about = "Authentication shell for plugin-based science portals")]
struct Cli {
    /// Settings file (YAML, or JSON by extension).
    #[arg(long, global = true, default_value = "settings.yaml")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in with the configured provider. For GitHub, pass the OAuth code as the password.
    Login {
        #[arg(long, default_value = "")]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Clear the stored session.
    Logout,
    /// Check the stored token with the auth server.
    Verify,
    /// Exchange the stored token for a fresh one.
    Refresh,
    /// Print the current gateway state.
    Status,
    /// Print the JSON schema of the settings file.
    Schema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Command::Schema = cli.command {
        print_schema();
        return Ok(());
    }

    let config = load_config(&cli.settings)
        .with_context(|| format!("loading settings from {}", cli.settings.display()))?;
    init_logging(&config.logging)?;

    let gateway = build_gateway(&config)?;
    let _listener = gateway.listen();
    let store = &gateway.store;

    let status = configure_site(store, &config).await?;
    info!("Site configured, auth status {:?}", status);

    let status = match &cli.command {
        Command::Login { username, password } => {
            intents::verify_username_and_password(store, username, password).await?
        }
        Command::Logout => intents::sign_out(store)?,
        Command::Verify => intents::verify_session(store).await?,
        Command::Refresh => intents::refresh_session(store).await?,
        Command::Status | Command::Schema => status,
    };

    println!("{}", serde_json::to_string_pretty(&summary(&store.state()?))?);

    match (&cli.command, status) {
        (Command::Login { .. }, AuthStatus::Unauthorised) => bail!("login failed"),
        (Command::Verify | Command::Refresh, AuthStatus::Expired) => bail!("session expired"),
        _ => Ok(()),
    }
}
