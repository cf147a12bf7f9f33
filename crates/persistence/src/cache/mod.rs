//! In-memory caching layer for the shop catalog
//!
//! The catalog is fetched as a whole listing, so the cache holds one
//! snapshot rather than per-item entries. Stock changes on every purchase,
//! so callers invalidate after any purchase or admin catalog mutation.

use hostcredits_core::Product;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Cached item with expiration
struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// Thread-safe TTL cache for the product listing
pub struct CatalogCache {
    listing: RwLock<Option<CacheEntry<Vec<Product>>>>,
    ttl: Duration,
}

impl CatalogCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            listing: RwLock::new(None),
            ttl,
        }
    }

    /// The cached listing, if present and fresh
    pub fn get(&self) -> Option<Vec<Product>> {
        let guard = self.listing.read().ok()?;
        let entry = guard.as_ref()?;
        if entry.is_expired() {
            None
        } else {
            Some(entry.value.clone())
        }
    }

    /// Look up one product in the fresh listing
    pub fn get_product(&self, id: &str) -> Option<Product> {
        self.get()?.into_iter().find(|p| p.id == id)
    }

    pub fn insert(&self, products: Vec<Product>) {
        if let Ok(mut guard) = self.listing.write() {
            *guard = Some(CacheEntry {
                value: products,
                inserted_at: Instant::now(),
                ttl: self.ttl,
            });
        }
    }

    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.listing.write() {
            *guard = None;
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.get().is_some()
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        // Catalog changes rarely; stock is refreshed on purchase anyway
        Self::new(Duration::from_secs(60))
    }
}
