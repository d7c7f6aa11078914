pub mod sender;

use crate::model::{FreeGames, NormalizedRecord, NotifyError};
use futures::future::join_all;
use reqwest::Client;
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{info, warn};

const TELEGRAM_API: &str = "https://api.telegram.org";

pub struct TelegramNotifier {
    pub api_base: String,
    pub bot_token: String,
    pub chat_id: i64,
    pub client: Client,
    announced: Mutex<HashSet<String>>,
}

/// Same game, same window: announced once per process.
fn announce_key(record: &NormalizedRecord) -> String {
    format!(
        "{}|{}",
        record.title,
        record
            .effective_date
            .map(|d| d.to_rfc3339())
            .unwrap_or_default()
    )
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: i64) -> Result<Self, NotifyError> {
        Self::with_api_base(TELEGRAM_API, bot_token, chat_id)
    }

    pub fn with_api_base(
        api_base: &str,
        bot_token: String,
        chat_id: i64,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::ApiError(e.to_string()))?;
        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token,
            chat_id,
            client,
            announced: Mutex::new(HashSet::new()),
        })
    }

    pub async fn notify_text(&self, text: &str) -> Result<(), NotifyError> {
        sender::send_text(self, text).await
    }

    pub async fn notify(&self, record: &NormalizedRecord) -> Result<(), NotifyError> {
        sender::send_record(self, record).await
    }

    /// Sends every record not announced yet. Returns how many went out.
    pub async fn announce_new(&self, games: &FreeGames) -> usize {
        let fresh: Vec<&NormalizedRecord> = {
            let announced = self.announced.lock().await;
            games
                .iter()
                .filter(|r| !announced.contains(&announce_key(r)))
                .collect()
        };

        if fresh.is_empty() {
            info!("Nothing new to announce");
            return 0;
        }

        let results = join_all(fresh.iter().map(|r| self.notify(r))).await;

        let mut announced = self.announced.lock().await;
        let mut sent = 0;
        for (record, result) in fresh.iter().zip(results) {
            match result {
                Ok(()) => {
                    announced.insert(announce_key(record));
                    sent += 1;
                }
                Err(e) => warn!("Telegram send error for {}: {}", record.title, e),
            }
        }
        info!("Announced {} of {} new free games", sent, fresh.len());
        sent
    }
}
