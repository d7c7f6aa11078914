use crate::model::{CatalogRequest, ScraperError};

#[async_trait::async_trait]
pub trait CatalogFetcher: Send + Sync {
    async fn fetch(&self, req: &CatalogRequest) -> Result<String, ScraperError>;
}
