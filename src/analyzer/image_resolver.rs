// Picks one display image per (title, role), memoized for the process lifetime.
use crate::config::ImageConfig;
use crate::model::ImageVariant;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    pub hits: u64,
    pub misses: u64,
    pub fallbacks: u64,
}

pub struct ImageResolver {
    fallback_roles: Vec<String>,
    fallback_url: String,
    cache: RwLock<HashMap<String, String>>,
    hits: AtomicU64,
    misses: AtomicU64,
    fallbacks: AtomicU64,
}

pub fn is_mystery_game(title: &str) -> bool {
    title.to_lowercase().contains("mystery")
}

/// The encoded title never contains a raw '_', so the key is unambiguous.
fn cache_key(title: &str, role: &str) -> String {
    format!("{}_{}", utf8_percent_encode(title, NON_ALPHANUMERIC), role)
}

impl ImageResolver {
    pub fn new(cfg: &ImageConfig) -> Self {
        Self {
            fallback_roles: cfg.fallback_roles.clone(),
            fallback_url: cfg.fallback_url.clone(),
            cache: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
        }
    }

    /// Returns exactly one non-empty URL for `role`.
    pub fn resolve(&self, title: &str, variants: Option<&[ImageVariant]>, role: &str) -> String {
        let key = cache_key(title, role);

        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(url) = cache.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return url.clone();
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let url = self.pick(title, variants, role);

        // Concurrent misses write the same value for the same key.
        self.cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, url.clone());
        url
    }

    fn pick(&self, title: &str, variants: Option<&[ImageVariant]>, role: &str) -> String {
        if is_mystery_game(title) {
            return self.fallback_url.clone();
        }

        let variants = match variants {
            Some(v) if !v.is_empty() => v,
            _ => {
                self.fallbacks.fetch_add(1, Ordering::Relaxed);
                warn!("{} ==> no image available (empty or invalid list)", title);
                return self.fallback_url.clone();
            }
        };

        let priority = std::iter::once(role).chain(self.fallback_roles.iter().map(String::as_str));
        for wanted in priority {
            if let Some(found) = variants
                .iter()
                .find(|img| img.role == wanted && !img.url.is_empty())
            {
                return found.url.clone();
            }
        }

        self.fallbacks.fetch_add(1, Ordering::Relaxed);
        warn!(
            "{} ==> no valid image among: {}, {}",
            title,
            role,
            self.fallback_roles.join(", ")
        );
        self.fallback_url.clone()
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Drops every memoized entry. Stats are kept.
    pub fn clear(&self) {
        self.cache.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self::new(&ImageConfig::default())
    }
}
