// Fetch + classify + resolve, with a short-lived memo of the whole result.
use crate::analyzer::Assembler;
use crate::config::AppConfig;
use crate::model::{CatalogRequest, FreeGames};
use crate::parser::CatalogParser;
use crate::scraper::CatalogFetcher;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Config seconds as a memo window; values chrono cannot hold saturate.
fn cache_window(seconds: u64) -> Duration {
    i64::try_from(seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

struct CachedResult {
    games: FreeGames,
    fetched_at: DateTime<Utc>,
}

pub struct FreeGamesService {
    fetcher: Box<dyn CatalogFetcher>,
    parser: Box<dyn CatalogParser + Send + Sync>,
    assembler: Assembler,
    request: CatalogRequest,
    cache_duration: Duration,
    cache: Mutex<Option<CachedResult>>,
}

impl FreeGamesService {
    pub fn new(
        fetcher: Box<dyn CatalogFetcher>,
        parser: Box<dyn CatalogParser + Send + Sync>,
        config: &AppConfig,
    ) -> Self {
        Self {
            fetcher,
            parser,
            assembler: Assembler::new(&config.images, config.include_all),
            request: CatalogRequest {
                country: config.country.clone(),
                locale: config.locale.clone(),
            },
            cache_duration: cache_window(config.cache_duration_seconds),
            cache: Mutex::new(None),
        }
    }

    pub fn assembler(&self) -> &Assembler {
        &self.assembler
    }

    /// Current and upcoming free games as of `now`. Upstream failures yield
    /// an empty result, which is not memoized.
    pub async fn free_games(&self, now: DateTime<Utc>) -> FreeGames {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if now - cached.fetched_at < self.cache_duration {
                let age = (now - cached.fetched_at).num_seconds();
                info!("Serving free games from cache (age {}s)", age);
                return cached.games.clone();
            }
        }

        info!("Fetching promotions catalog...");
        let body = match self.fetcher.fetch(&self.request).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Catalog fetch error: {}", e);
                return FreeGames::default();
            }
        };

        info!("Parsing catalog...");
        let offers = match self.parser.parse(&body) {
            Ok(offers) => offers,
            Err(e) => {
                warn!("Parse error: {}", e);
                return FreeGames::default();
            }
        };

        let games = self
            .assembler
            .compute_records(&offers, now, &self.request.locale);

        *cache = Some(CachedResult {
            games: games.clone(),
            fetched_at: now,
        });
        games
    }

    /// Forgets the memoized result; the image cache is left alone.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    /// Forgets the memoized result and every resolved image.
    pub async fn flush(&self) {
        self.invalidate().await;
        self.assembler.resolver().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScraperError;
    use crate::parser::EpicParser;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeFetcher {
        body: Option<String>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl CatalogFetcher for FakeFetcher {
        async fn fetch(&self, _req: &CatalogRequest) -> Result<String, ScraperError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.body.clone().ok_or(ScraperError::Timeout)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 20, 12, 0, 0).unwrap()
    }

    fn body() -> String {
        json!({ "data": { "Catalog": { "searchStore": { "elements": [
            {
                "title": "X",
                "offerType": "BASE_GAME",
                "price": { "totalPrice": { "discountPrice": 0 } },
                "promotions": { "promotionalOffers": [{ "promotionalOffers": [{
                    "startDate": "2025-12-19T12:00:00.000Z",
                    "endDate": "2025-12-21T12:00:00.000Z"
                }]}]}
            },
            {
                "title": "Y",
                "offerType": "BASE_GAME",
                "price": { "totalPrice": { "discountPrice": 1999 } },
                "promotions": { "upcomingPromotionalOffers": [{ "promotionalOffers": [{
                    "startDate": "2025-12-22T12:00:00.000Z",
                    "endDate": "2025-12-29T12:00:00.000Z",
                    "discountSetting": { "discountPercentage": 0 }
                }]}]}
            }
        ]}}}})
        .to_string()
    }

    fn service(body: Option<String>, calls: Arc<AtomicUsize>) -> FreeGamesService {
        service_with(body, calls, &AppConfig::default())
    }

    fn service_with(
        body: Option<String>,
        calls: Arc<AtomicUsize>,
        config: &AppConfig,
    ) -> FreeGamesService {
        FreeGamesService::new(
            Box::new(FakeFetcher { body, calls }),
            Box::new(EpicParser::new()),
            config,
        )
    }

    #[tokio::test]
    async fn fetches_and_splits_catalog() {
        let calls = Arc::new(AtomicUsize::new(0));
        let games = service(Some(body()), calls.clone()).free_games(now()).await;
        assert_eq!(games.current.iter().map(|r| r.title.as_str()).collect::<Vec<_>>(), ["X"]);
        assert_eq!(games.upcoming.iter().map(|r| r.title.as_str()).collect::<Vec<_>>(), ["Y"]);
        assert_eq!(games.current[0].url, "https://store.epicgames.com/fr/free-games");
    }

    #[tokio::test]
    async fn result_is_memoized_within_window() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = service(Some(body()), calls.clone());

        let first = svc.free_games(now()).await;
        let second = svc.free_games(now() + Duration::seconds(299)).await;
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        svc.free_games(now() + Duration::seconds(300)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        svc.invalidate().await;
        svc.free_games(now() + Duration::seconds(301)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn upstream_failure_yields_empty_and_is_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = service(None, calls.clone());

        assert!(svc.free_games(now()).await.is_empty());
        assert!(svc.free_games(now()).await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unparsable_body_yields_empty() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = service(Some("<html>oops</html>".into()), calls);
        assert!(svc.free_games(now()).await.is_empty());
    }

    #[test]
    fn cache_window_saturates_instead_of_overflowing() {
        assert_eq!(cache_window(300), Duration::seconds(300));
        assert_eq!(cache_window(0), Duration::zero());
        assert_eq!(cache_window(10_000_000_000_000_000), Duration::MAX);
        assert_eq!(cache_window(u64::MAX), Duration::MAX);
    }

    #[tokio::test]
    async fn huge_cache_duration_keeps_memo_on() {
        for raw in ["10000000000000000", "18446744073709551615"] {
            let json = format!(r#"{{"cache_duration_seconds": {}}}"#, raw);
            let cfg = crate::config::parse_config(&json).unwrap();
            let calls = Arc::new(AtomicUsize::new(0));
            let svc = service_with(Some(body()), calls.clone(), &cfg);

            svc.free_games(now()).await;
            svc.free_games(now() + Duration::days(365)).await;
            assert_eq!(calls.load(Ordering::SeqCst), 1, "memo lost for {}", raw);
        }
    }

    #[tokio::test]
    async fn flush_drops_result_and_images() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = service(Some(body()), calls.clone());

        svc.free_games(now()).await;
        assert!(svc.assembler().resolver().len() > 0);

        svc.flush().await;
        assert_eq!(svc.assembler().resolver().len(), 0);
        svc.free_games(now()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
