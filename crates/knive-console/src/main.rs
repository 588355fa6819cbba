mod app;
mod context;
mod event;
mod orchestrator;
mod shell;
mod store;
#[cfg(test)]
mod testing;
mod theme;
mod tui_shell;
mod widgets;

use std::sync::Arc;

use knive_proto::api::ApiClient;
use knive_proto::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = knive_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("console.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_default();

    // RUST_LOG wins over the configured filter.
    let log_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.console.log_filter.clone());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("knive console log: {}", log_path.display());

    tracing::info!("knive console starting, backend at {}", config.api.base_url);

    let backend = Arc::new(ApiClient::new(&config.api)?);
    app::run(&config, backend).await
}
