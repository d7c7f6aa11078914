use crate::model::{CatalogRequest, ScraperError};
use crate::scraper::traits::CatalogFetcher;

use reqwest::Client;
use std::time::Duration;
use tracing::info;

const PROMOTIONS_URL: &str =
    "https://store-site-backend-static.ak.epicgames.com/freeGamesPromotions";

pub struct ScraperImpl {
    client: Client,
    url: String,
}

impl ScraperImpl {
    pub fn new() -> Result<Self, ScraperError> {
        Self::with_url(PROMOTIONS_URL)
    }

    pub fn with_url(url: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) EpicFreeSniperBot/0.1")
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| ScraperError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl CatalogFetcher for ScraperImpl {
    async fn fetch(&self, req: &CatalogRequest) -> Result<String, ScraperError> {
        info!("GET {} (country={}, locale={})", self.url, req.country, req.locale);

        let response = self
            .client
            .get(&self.url)
            .query(&[("country", req.country.as_str()), ("locale", req.locale.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScraperError::Timeout
                } else {
                    ScraperError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::InvalidResponse(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| ScraperError::HttpError(e.to_string()))
    }
}
