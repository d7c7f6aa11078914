// Zips classification and image resolution into display records.
use crate::analyzer::image_resolver::ImageResolver;
use crate::analyzer::promotion::{classify, is_eligible_type};
use crate::config::ImageConfig;
use crate::model::{Bucket, Classification, FreeGames, NormalizedRecord, Offer};
use crate::utils::{language_of, parse_datetime};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

const STORE_BASE_URL: &str = "https://store.epicgames.com";

pub struct Assembler {
    resolver: ImageResolver,
    thumbnail_role: String,
    banner_role: String,
    include_all: bool,
}

impl Assembler {
    pub fn new(images: &ImageConfig, include_all: bool) -> Self {
        Self {
            resolver: ImageResolver::new(images),
            thumbnail_role: images.thumbnail_role.clone(),
            banner_role: images.banner_role.clone(),
            include_all,
        }
    }

    pub fn resolver(&self) -> &ImageResolver {
        &self.resolver
    }

    /// Splits a fetched catalog into current and upcoming free games.
    /// Upcoming games are ordered by start date, soonest first.
    pub fn compute_records(&self, offers: &[Offer], now: DateTime<Utc>, locale: &str) -> FreeGames {
        let mut result = FreeGames::default();

        for offer in offers {
            if !is_eligible_type(offer, self.include_all) {
                debug!("Skipping {} ({})", offer.title, offer.offer_type);
                continue;
            }

            let classification = classify(offer, now);
            let target = match classification.bucket {
                Bucket::Current => &mut result.current,
                Bucket::Upcoming => &mut result.upcoming,
                Bucket::None => continue,
            };
            target.push(self.build_record(offer, &classification, locale));
        }

        // Stable: equal or missing dates keep catalog order, missing dates last.
        result
            .upcoming
            .sort_by_key(|r| (r.effective_date.is_none(), r.effective_date));

        info!(
            "Assembled {} current / {} upcoming free games",
            result.current.len(),
            result.upcoming.len()
        );
        result
    }

    fn build_record(&self, offer: &Offer, c: &Classification, locale: &str) -> NormalizedRecord {
        let variants = offer.image_variants.as_deref();
        debug!(
            "{} [{}] regular price {:?}",
            offer.title,
            c.bucket.label(),
            offer.price.original_amount
        );

        NormalizedRecord {
            title: offer.title.clone(),
            description: offer.description.clone(),
            author: offer
                .seller_name
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Unknown".into()),
            offer_type: offer.offer_type.clone(),
            url: store_url(offer.page_slug.as_deref(), locale),
            effective_date: c
                .window_start
                .or_else(|| offer.effective_date.as_deref().and_then(parse_datetime)),
            expiry_date: c
                .window_end
                .or_else(|| offer.expiry_date.as_deref().and_then(parse_datetime)),
            thumbnail: self.resolver.resolve(&offer.title, variants, &self.thumbnail_role),
            image: self.resolver.resolve(&offer.title, variants, &self.banner_role),
            price: offer
                .price
                .formatted_discount_price
                .clone()
                .unwrap_or_else(|| "0".into()),
            status: c.bucket,
            color: c.bucket.color(),
        }
    }
}

pub fn store_url(page_slug: Option<&str>, locale: &str) -> String {
    let lang = language_of(locale);
    match page_slug.filter(|s| !s.is_empty()) {
        Some(slug) => format!("{}/{}/p/{}", STORE_BASE_URL, lang, slug),
        None => format!("{}/{}/free-games", STORE_BASE_URL, lang),
    }
}
