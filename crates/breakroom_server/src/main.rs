//! Break Room - unified CLI
//!
//! Serves the chat endpoints and answers local questions about themes and
//! player statistics.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use breakroom_server::{
    AppState, Dispatcher, GameKind, HistoryRecorder, HistoryRepository, HttpRenderer, JobQueue,
    MemoryStore, Notifier, Renderer, ServerConfig, SessionStore, ThemeCatalog, WebhookNotifier,
    build_router,
};
use clap::Parser;
use cli::{Cli, Command};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::load_or_default(&cli.config)
        .context("loading config")?
        .with_env_overrides()
        .context("applying environment overrides")?;

    match cli.command {
        Command::Serve { host, port } => serve(config, host, port).await,
        Command::Themes => {
            print_themes(&ThemeCatalog::from_config(&config));
            Ok(())
        }
        Command::Stats { player, recent } => print_stats(&config, &player, recent),
    }
}

/// Run the HTTP server until Ctrl-C, then drain the outcome workers.
#[instrument(skip(config))]
async fn serve(config: ServerConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let repository = HistoryRepository::new(config.database_path().clone())?;
    repository.run_migrations()?;

    let timeout = config.collaborator_timeout();
    let renderer: Arc<dyn Renderer> =
        Arc::new(HttpRenderer::new(config.render_url().clone(), timeout)?);
    let notifier: Arc<dyn Notifier> = Arc::new(WebhookNotifier::new(timeout)?);
    let recorder: Arc<dyn HistoryRecorder> = Arc::new(repository);
    let (jobs, workers) = JobQueue::spawn(
        *config.workers(),
        *config.queue_capacity(),
        timeout,
        recorder,
        Arc::clone(&notifier),
        Arc::clone(&renderer),
    );

    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
    let dispatcher = Dispatcher::new(store, renderer, notifier, jobs, &config);
    let app = build_router(AppState {
        dispatcher: Arc::new(dispatcher),
    });

    let host = host.unwrap_or_else(|| config.host().clone());
    let port = port.unwrap_or(*config.port());
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("binding {}:{}", host, port))?;
    info!(%host, port, render_url = %config.render_url(), "Break Room listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, waiting for outcome workers");
    workers.join().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
    }
    info!("Shutdown requested");
}

fn print_themes(catalog: &ThemeCatalog) {
    for kind in [GameKind::Connect4, GameKind::Mastermind] {
        println!("{}: {}", kind, catalog.themes(kind).join(", "));
    }
}

#[instrument(skip(config))]
fn print_stats(config: &ServerConfig, player: &str, recent: i64) -> Result<()> {
    let repository = HistoryRepository::new(config.database_path().clone())?;
    repository.run_migrations()?;

    let stats = repository.aggregated_stats(player)?;
    println!(
        "{}: {} games, {} wins, {} losses, {} draws ({:.1}% won)",
        player,
        stats.total_games(),
        stats.wins(),
        stats.losses(),
        stats.draws(),
        stats.win_rate()
    );

    if recent > 0 {
        for (result, game) in repository.recent_for_player(player, recent)? {
            println!(
                "  {:<4} {:<10} {:>3} moves  {}  {}",
                result.outcome(),
                game.game_kind(),
                game.moves_count(),
                game.ended_at().format("%Y-%m-%d %H:%M"),
                game.recap_url().as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}
