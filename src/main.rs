mod analyzer;
mod config;
mod model;
mod notifier;
mod parser;
mod scraper;
mod service;
mod utils;

use chrono::Utc;
use config::{load_config, AppConfig};
use model::FreeGames;
use notifier::TelegramNotifier;
use parser::EpicParser;
use scraper::ScraperImpl;
use service::FreeGamesService;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".into());
    let config: AppConfig = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error ({}): {}", config_path, e);
            return;
        }
    };

    let scraper = match ScraperImpl::new() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return;
        }
    };
    let service = FreeGamesService::new(Box::new(scraper), Box::new(EpicParser::new()), &config);

    let notifier = match (&config.telegram_bot_token, config.telegram_chat_id) {
        (Some(token), Some(chat_id)) => match TelegramNotifier::new(token.clone(), chat_id) {
            Ok(n) => Some(n),
            Err(e) => {
                warn!("Telegram disabled: {}", e);
                None
            }
        },
        _ => {
            info!("Telegram not configured, logging only");
            None
        }
    };

    if let Some(notifier) = &notifier {
        info!("Sending startup message...");
        if let Err(e) = notifier.notify_text("🚀 EpicFreeSniper started!").await {
            warn!("Startup notification failed: {}", e);
        }
    }

    loop {
        info!(
            "Checking free games for {} / {}...",
            config.country, config.locale
        );
        let games = service.free_games(Utc::now()).await;
        if games.is_empty() {
            warn!("No free games this cycle (upstream unavailable or nothing on offer)");
        }
        log_games(&games);

        let stats = service.assembler().resolver().stats();
        info!(
            "Image cache: {} entries, {} hits, {} misses, {} fallbacks",
            service.assembler().resolver().len(),
            stats.hits,
            stats.misses,
            stats.fallbacks
        );

        if let Some(notifier) = &notifier {
            notifier.announce_new(&games).await;
        }

        info!("Waiting {}s before next check...", config.check_interval_seconds);
        tokio::select! {
            _ = sleep(Duration::from_secs(config.check_interval_seconds)) => {
                info!("Timer triggered.");
            }
            _ = hangup() => {
                info!("SIGHUP received, flushing caches.");
                service.flush().await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down.");
                break;
            }
        }
    }
}

/// Resolves on SIGHUP; never on platforms without it.
#[cfg(unix)]
async fn hangup() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::hangup()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            warn!("Cannot listen for SIGHUP: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn hangup() {
    std::future::pending::<()>().await;
}

fn log_games(games: &FreeGames) {
    info!("Number of free games: {}", games.current.len() + games.upcoming.len());
    for game in games.iter() {
        info!(
            "[{}] {} | {} | {:?} -> {:?} | {} | {}",
            game.status.label(),
            game.title,
            game.author,
            game.effective_date,
            game.expiry_date,
            game.price,
            game.url
        );
    }
}
