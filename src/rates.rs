//! Short-lived cache of quoted shipping rates
//!
//! Entries are keyed by `(destination zip, weight)` so repeat quotes for
//! the same shipment parameters are recognized as the same shipment
//! across turns. A reverse index maps each opaque `rate_id` back to its
//! owning entry. Quotes older than fifteen minutes are stale: staleness
//! never blocks use, it only attaches a warning.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::shipping::RateQuote;

/// Freshness window for cached quotes.
pub const RATE_CACHE_MAX_AGE_MINUTES: i64 = 15;

/// A cached set of quotes for one `(zip, weight)` key.
#[derive(Debug, Clone)]
pub struct CachedRateSet {
    /// Sorted ascending by price
    pub rates: Vec<RateQuote>,
    pub destination_zip: String,
    pub weight_oz: f64,
    pub created_at: DateTime<Utc>,
}

impl CachedRateSet {
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > Duration::minutes(RATE_CACHE_MAX_AGE_MINUTES)
    }

    pub fn age_minutes(&self, now: DateTime<Utc>) -> f64 {
        (now - self.created_at).num_seconds() as f64 / 60.0
    }
}

/// Result of resolving a rate id.
///
/// Not-found and expired are normal outcomes with distinct user-visible
/// wordings, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum RateLookup {
    /// The quote is usable; `warning` is set when it has gone stale.
    Found {
        quote: RateQuote,
        warning: Option<String>,
    },
    /// The id was never cached (or its entry was superseded).
    NotFound { message: String },
    /// The index knew the id but its entry is gone.
    Expired { message: String },
}

/// Cache of quoted rates with a `rate_id` reverse index.
#[derive(Debug, Default)]
pub struct RateCache {
    entries: HashMap<String, CachedRateSet>,
    rate_index: HashMap<String, String>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn cache_key(destination_zip: &str, weight_oz: f64) -> String {
        format!("{}:{}", destination_zip, weight_oz)
    }

    /// Store a fresh quote set, fully evicting any previous entry for the
    /// same `(zip, weight)` key along with its reverse-index ids.
    pub fn put(&mut self, destination_zip: &str, weight_oz: f64, rates: Vec<RateQuote>) {
        let key = Self::cache_key(destination_zip, weight_oz);

        if let Some(old) = self.entries.remove(&key) {
            for rate in &old.rates {
                self.rate_index.remove(&rate.rate_id);
            }
        }

        for rate in &rates {
            self.rate_index.insert(rate.rate_id.clone(), key.clone());
        }
        self.entries.insert(
            key,
            CachedRateSet {
                rates,
                destination_zip: destination_zip.to_string(),
                weight_oz,
                created_at: Utc::now(),
            },
        );
    }

    /// Resolve a rate id to its quote, with staleness annotation.
    pub fn resolve(&self, rate_id: &str) -> RateLookup {
        self.resolve_at(rate_id, Utc::now())
    }

    fn resolve_at(&self, rate_id: &str, now: DateTime<Utc>) -> RateLookup {
        let Some(key) = self.rate_index.get(rate_id) else {
            return RateLookup::NotFound {
                message: format!(
                    "Rate ID '{}' not found in cache. Please request new rates.",
                    rate_id
                ),
            };
        };

        let Some(cached) = self.entries.get(key) else {
            return RateLookup::Expired {
                message: format!("Rate cache expired for '{}'. Please request new rates.", rate_id),
            };
        };

        match cached.rates.iter().find(|r| r.rate_id == rate_id) {
            Some(quote) => {
                let warning = cached.is_stale(now).then(|| {
                    format!(
                        "Warning: These rates are {:.0} minutes old and may no longer be accurate. \
                         Consider requesting fresh rates.",
                        cached.age_minutes(now)
                    )
                });
                RateLookup::Found {
                    quote: quote.clone(),
                    warning,
                }
            }
            None => RateLookup::NotFound {
                message: format!("Rate ID '{}' not found. Please request new rates.", rate_id),
            },
        }
    }

    /// The cache entry that owns a rate id, for parameter-mismatch checks.
    pub fn entry_for(&self, rate_id: &str) -> Option<&CachedRateSet> {
        self.rate_index
            .get(rate_id)
            .and_then(|key| self.entries.get(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shift an entry's creation time backwards, to exercise staleness.
    #[cfg(test)]
    pub(crate) fn backdate(&mut self, rate_id: &str, minutes: i64) {
        if let Some(key) = self.rate_index.get(rate_id) {
            if let Some(entry) = self.entries.get_mut(key) {
                entry.created_at -= Duration::minutes(minutes);
            }
        }
    }
}
