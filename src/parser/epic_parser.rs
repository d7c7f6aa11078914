// Epic Games Store promotions JSON parsing
use crate::model::{
    ImageVariant, Offer, ParserError, PriceInfo, PromotionWindow, UpcomingWindow,
};
use serde::Deserialize;
use tracing::{info, warn};

pub trait CatalogParser {
    fn parse(&self, body: &str) -> Result<Vec<Offer>, ParserError>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Response {
    data: Option<Data>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct Data {
    catalog: Option<Catalog>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Catalog {
    search_store: Option<SearchStore>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchStore {
    elements: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawElement {
    title: Option<String>,
    description: Option<String>,
    offer_type: Option<String>,
    effective_date: Option<String>,
    expiry_date: Option<String>,
    seller: Option<RawSeller>,
    price: Option<RawPrice>,
    promotions: Option<RawPromotions>,
    key_images: Option<Vec<RawKeyImage>>,
    catalog_ns: Option<RawCatalogNs>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSeller {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawPrice {
    total_price: Option<RawTotalPrice>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawTotalPrice {
    discount_price: Option<i64>,
    original_price: Option<i64>,
    fmt_price: Option<RawFmtPrice>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawFmtPrice {
    discount_price: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawPromotions {
    promotional_offers: Option<Vec<RawOfferGroup>>,
    upcoming_promotional_offers: Option<Vec<RawOfferGroup>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawOfferGroup {
    promotional_offers: Option<Vec<RawPromotion>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawPromotion {
    start_date: Option<String>,
    end_date: Option<String>,
    discount_setting: Option<RawDiscountSetting>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawDiscountSetting {
    discount_percentage: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawKeyImage {
    #[serde(rename = "type")]
    kind: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCatalogNs {
    mappings: Option<Vec<RawMapping>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawMapping {
    page_slug: Option<String>,
}

pub struct EpicParser;

impl EpicParser {
    pub fn new() -> Self {
        Self
    }
}

impl CatalogParser for EpicParser {
    /// A body that is not JSON is an error; a JSON body without the catalog
    /// path yields no offers.
    fn parse(&self, body: &str) -> Result<Vec<Offer>, ParserError> {
        let response: Response = serde_json::from_str(body)?;

        let elements = response
            .data
            .and_then(|d| d.catalog)
            .and_then(|c| c.search_store)
            .map(|s| s.elements)
            .unwrap_or_default();

        let mut offers = Vec::with_capacity(elements.len());
        for (index, value) in elements.into_iter().enumerate() {
            // One bad element must not sink the batch.
            match serde_json::from_value::<RawElement>(value) {
                Ok(raw) => match into_offer(raw) {
                    Some(offer) => offers.push(offer),
                    None => warn!("Catalog element #{} has no title, skipped", index),
                },
                Err(e) => warn!("Catalog element #{} has an unexpected shape: {}", index, e),
            }
        }

        info!("Parsed {} offers from catalog", offers.len());
        Ok(offers)
    }
}

fn first_promotion(groups: Option<&Vec<RawOfferGroup>>) -> Option<&RawPromotion> {
    groups
        .and_then(|g| g.first())
        .and_then(|g| g.promotional_offers.as_ref())
        .and_then(|p| p.first())
}

fn into_offer(raw: RawElement) -> Option<Offer> {
    let title = raw.title.filter(|t| !t.trim().is_empty())?;
    let promotions = raw.promotions.unwrap_or_default();
    let total = raw.price.and_then(|p| p.total_price).unwrap_or_default();

    let current_windows = first_promotion(promotions.promotional_offers.as_ref())
        .map(|p| PromotionWindow {
            start: p.start_date.clone(),
            end: p.end_date.clone(),
        })
        .into_iter()
        .collect();

    let upcoming_windows = first_promotion(promotions.upcoming_promotional_offers.as_ref())
        .map(|p| UpcomingWindow {
            start: p.start_date.clone(),
            end: p.end_date.clone(),
            discount_percentage: p.discount_setting.as_ref().and_then(|d| d.discount_percentage),
        })
        .into_iter()
        .collect();

    let image_variants = raw.key_images.map(|images| {
        images
            .into_iter()
            .filter_map(|img| match (img.kind, img.url) {
                (Some(role), Some(url)) => Some(ImageVariant { role, url }),
                _ => None,
            })
            .collect()
    });

    let page_slug = raw
        .catalog_ns
        .and_then(|ns| ns.mappings)
        .and_then(|m| m.into_iter().next())
        .and_then(|m| m.page_slug);

    Some(Offer {
        title,
        description: raw.description.unwrap_or_default(),
        seller_name: raw.seller.and_then(|s| s.name),
        offer_type: raw.offer_type.unwrap_or_default(),
        price: PriceInfo {
            original_amount: total.original_price,
            discount_amount: total.discount_price,
            formatted_discount_price: total.fmt_price.and_then(|f| f.discount_price),
        },
        current_windows,
        upcoming_windows,
        image_variants,
        page_slug,
        effective_date: raw.effective_date,
        expiry_date: raw.expiry_date,
    })
}
