use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use hwbot_channels::telegram::{describe_recipient, TelegramNotifier};
use hwbot_core::{Poller, Settings};
use hwbot_provider::PracticumClient;
use tokio_util::sync::CancellationToken;

mod logging;

#[derive(Parser, Debug)]
#[command(
    name = "hwbot",
    version,
    about = "Relay homework review status changes to a Telegram chat"
)]
struct Cli {
    #[arg(long, help = "Also write logs to <DIR>/hwbot.log, rotated daily")]
    log_dir: Option<PathBuf>,

    #[arg(long, help = "Load environment variables from this file instead of ./.env")]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env before logging so RUST_LOG can come from it.
    let env_file = match &cli.env_file {
        Some(path) => Some(
            dotenvy::from_path(path)
                .map(|_| path.clone())
                .with_context(|| format!("failed to load env file {}", path.display()))?,
        ),
        None => dotenvy::dotenv().ok(),
    };

    let _guard = logging::init(cli.log_dir.as_deref())?;
    if let Some(path) = env_file {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(critical = true, "Cannot start the bot: {e}");
            return Err(e.into());
        }
    };
    tracing::debug!("Loaded settings: {:?}", settings);

    let api = Arc::new(PracticumClient::new(
        &settings.endpoint,
        &settings.practicum_token,
        settings.request_timeout,
    ));
    let notifier = Arc::new(TelegramNotifier::new(
        &settings.telegram_token,
        settings.chat.clone(),
    ));

    tracing::info!(
        "Starting homework bot for {} (endpoint {})",
        describe_recipient(&settings.chat),
        api.endpoint()
    );

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown(cancel.clone()));

    let state = Poller::new(api, notifier, settings.retry_interval)
        .run(cancel)
        .await;
    tracing::info!("Homework bot stopped (last phase {:?})", state.phase);

    Ok(())
}

async fn cancel_on_shutdown(cancel: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("Received SIGINT, shutting down..."),
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("failed to install SIGTERM handler: {e}");
                ctrl_c.await.ok();
                tracing::info!("Received SIGINT, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        tracing::info!("Received SIGINT, shutting down...");
    }
    cancel.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn runs_without_arguments() {
        let cli = Cli::try_parse_from(["hwbot"]).unwrap();
        assert!(cli.log_dir.is_none());
        assert!(cli.env_file.is_none());
    }

    #[test]
    fn accepts_log_dir_and_env_file() {
        let cli =
            Cli::try_parse_from(["hwbot", "--log-dir", "/var/log/hwbot", "--env-file", "bot.env"])
                .unwrap();
        assert_eq!(cli.log_dir, Some(PathBuf::from("/var/log/hwbot")));
        assert_eq!(cli.env_file, Some(PathBuf::from("bot.env")));
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(Cli::try_parse_from(["hwbot", "--interval", "5"]).is_err());
    }
}
