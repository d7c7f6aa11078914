// Core structs: Offer, Classification, NormalizedRecord
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// One catalog entry as handed over by the parser. Dates stay as raw text so
/// the classifier decides what is parsable.
#[derive(Debug, Clone, Default)]
pub struct Offer {
    pub title: String,
    pub description: String,
    pub seller_name: Option<String>,
    pub offer_type: String,
    pub price: PriceInfo,
    pub current_windows: Vec<PromotionWindow>,
    pub upcoming_windows: Vec<UpcomingWindow>,
    pub image_variants: Option<Vec<ImageVariant>>,
    pub page_slug: Option<String>,
    pub effective_date: Option<String>,
    pub expiry_date: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PriceInfo {
    pub original_amount: Option<i64>,
    pub discount_amount: Option<i64>,
    pub formatted_discount_price: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PromotionWindow {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpcomingWindow {
    pub start: Option<String>,
    pub end: Option<String>,
    pub discount_percentage: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageVariant {
    pub role: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Current,
    Upcoming,
    None,
}

impl Bucket {
    pub fn label(self) -> &'static str {
        match self {
            Bucket::Current => "currentGames",
            Bucket::Upcoming => "nextGames",
            Bucket::None => "none",
        }
    }

    /// Embed color used by chat front-ends.
    pub fn color(self) -> u32 {
        match self {
            Bucket::Current => 0x3498db,
            Bucket::Upcoming => 0x9b59b6,
            Bucket::None => 0x95a5a6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub bucket: Bucket,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
}

impl Classification {
    pub fn none() -> Self {
        Self {
            bucket: Bucket::None,
            window_start: None,
            window_end: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub title: String,
    pub description: String,
    pub author: String,
    pub offer_type: String,
    pub url: String,
    pub effective_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub thumbnail: String,
    pub image: String,
    pub price: String,
    pub status: Bucket,
    pub color: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FreeGames {
    pub current: Vec<NormalizedRecord>,
    pub upcoming: Vec<NormalizedRecord>,
}

impl FreeGames {
    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.upcoming.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NormalizedRecord> {
        self.current.iter().chain(self.upcoming.iter())
    }
}

#[derive(Debug, Clone)]
pub struct CatalogRequest {
    pub country: String,
    pub locale: String,
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("http error: {0}")]
    HttpError(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected status {0}")]
    InvalidResponse(u16),
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("malformed catalog json: {0}")]
    JsonParseError(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("telegram api error: {0}")]
    ApiError(String),
    #[error("telegram unreachable")]
    Unreachable,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
