use crate::model::ConfigError;
use serde::Deserialize;
use std::fs;

pub const MYSTERY_TEASER_URL: &str = "https://cdn1.epicgames.com/offer/d5241c76f178492ea1540fce45616757/Holiday25_FreeGames_Teaser_2560x1440_2560x1440-012542ce76be0f7521af765ba97d3453";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub thumbnail_role: String,
    pub banner_role: String,
    /// Tried in order after the requested role.
    pub fallback_roles: Vec<String>,
    pub fallback_url: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            thumbnail_role: "Thumbnail".into(),
            banner_role: "OfferImageWide".into(),
            fallback_roles: vec![
                "DieselStoreFrontTall".into(),
                "DieselStoreFrontWide".into(),
                "VaultClosed".into(),
                "featuredMedia".into(),
            ],
            fallback_url: MYSTERY_TEASER_URL.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub country: String,
    pub locale: String,
    pub include_all: bool,
    pub check_interval_seconds: u64,
    pub cache_duration_seconds: u64,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<i64>,
    pub images: ImageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            country: "FR".into(),
            locale: "fr-FR".into(),
            include_all: false,
            check_interval_seconds: 3600,
            cache_duration_seconds: 300,
            telegram_bot_token: None,
            telegram_chat_id: None,
            images: ImageConfig::default(),
        }
    }
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    Ok(config)
}
