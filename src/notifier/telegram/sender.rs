// notifier/telegram/sender.rs

use crate::model::{Bucket, NormalizedRecord, NotifyError};
use crate::notifier::telegram::TelegramNotifier;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Sends a simple text message via Telegram.
pub async fn send_text(notifier: &TelegramNotifier, text: &str) -> Result<(), NotifyError> {
    let url = format!("{}/bot{}/sendMessage", notifier.api_base, notifier.bot_token);
    let params = [
        ("chat_id", notifier.chat_id.to_string()),
        ("text", text.to_string()),
    ];
    let response = notifier
        .client
        .post(&url)
        .form(&params)
        .send()
        .await
        .map_err(|e| NotifyError::ApiError(e.to_string()))?;
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|_| "unknown".into());
    if !status.is_success() {
        warn!("❌ Telegram text error [{}]: {}", status, body);
        return Err(NotifyError::Unreachable);
    }
    info!("✅ Telegram text sent [{}]", status);
    Ok(())
}

pub fn format_record(record: &NormalizedRecord) -> String {
    let emoji = match record.status {
        Bucket::Current => "🟢",
        _ => "🟡",
    };
    let date = |d: Option<chrono::DateTime<chrono::Utc>>| {
        d.map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "?".into())
    };
    format!(
        "{} {}\n🏷️ {}\n🕒 {} → {}\n💶 {}\n🔗 {}",
        emoji,
        record.title,
        record.author,
        date(record.effective_date),
        date(record.expiry_date),
        record.price,
        record.url
    )
}

/// Sends a free game as a photo with caption, banner image on top.
pub async fn send_record(
    notifier: &TelegramNotifier,
    record: &NormalizedRecord,
) -> Result<(), NotifyError> {
    let url = format!("{}/bot{}/sendPhoto", notifier.api_base, notifier.bot_token);
    let caption = format_record(record);
    info!("📤 Sending Telegram message:\n{}", caption);
    let response = match timeout(
        Duration::from_secs(10),
        notifier
            .client
            .post(&url)
            .form(&[
                ("chat_id", notifier.chat_id.to_string()),
                ("photo", record.image.clone()),
                ("caption", caption),
            ])
            .send(),
    )
    .await
    {
        Ok(Ok(resp)) => resp,
        Ok(Err(e)) => {
            warn!("❌ Telegram send() failed: {:?}", e);
            return Err(NotifyError::ApiError(format!("Send failed: {}", e)));
        }
        Err(_) => {
            warn!("⏳ Telegram send() timed out");
            return Err(NotifyError::Unreachable);
        }
    };
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|_| "unknown".into());
    if !status.is_success() {
        warn!("❌ Telegram API responded [{}]: {}", status, body);
        return Err(NotifyError::Unreachable);
    }
    info!("✅ Telegram response [{}]", status);
    Ok(())
}
