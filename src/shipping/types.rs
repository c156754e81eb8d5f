//! Shipping domain types and the provider seam
//!
//! `ShippingProvider` is the trust boundary to the carrier-rate backend.
//! Provider failures surface as `ShippingError`, whose `Display` text is
//! deliberately user-safe: raw backend error detail (which may contain
//! credentials or internal URLs) is logged at the call site and never
//! rendered into chat.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A US shipping address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub street1: String,
    #[serde(default)]
    pub street2: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub phone: String,
}

fn default_country() -> String {
    "US".to_string()
}

impl Address {
    pub fn new(
        name: impl Into<String>,
        street1: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip_code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            street1: street1.into(),
            street2: String::new(),
            city: city.into(),
            state: state.into(),
            zip_code: zip_code.into(),
            country: default_country(),
            phone: String::new(),
        }
    }
}

/// Package dimensions (inches) and weight (ounces).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight_oz: f64,
}

impl Parcel {
    /// Standard small-box dimensions: 6 x 4 x 2 inches.
    pub fn standard(weight_oz: f64) -> Self {
        Self {
            length: 6.0,
            width: 4.0,
            height: 2.0,
            weight_oz,
        }
    }
}

/// A priced shipping option for a specific parcel and destination.
/// Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    pub carrier: String,
    pub service: String,
    /// Price in dollars
    pub price: f64,
    pub delivery_days: Option<u32>,
    pub rate_id: String,
}

/// A purchased shipment with its label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: String,
    pub tracking_number: String,
    pub label_url: String,
    pub carrier: String,
    pub service: String,
    pub price: f64,
}

/// Outcome of address verification.
///
/// An invalid address is a normal business outcome, not an error; only
/// an API-level failure produces a `ShippingError`.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressVerification {
    pub valid: bool,
    pub standardized: Option<Address>,
    pub message: String,
}

/// One scan event in a tracking history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub status: String,
    pub message: String,
    pub location: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Live tracking state for a shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingStatus {
    pub status: String,
    pub estimated_delivery: Option<String>,
    pub events: Vec<TrackingEvent>,
}

/// User-safe shipping provider failures.
///
/// The `Display` strings are what merchants see in chat.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShippingError {
    #[error("Unable to fetch shipping rates. Please verify the address and try again.")]
    Rates,

    #[error("An error occurred while validating the address.")]
    AddressVerification,

    #[error("Unable to create shipment. Please verify the address and try again.")]
    Shipment,

    #[error("Unable to purchase shipping label. The rate may have expired.")]
    Purchase,

    #[error("Tracking number not found. Please verify the number is correct.")]
    TrackingNotFound,

    #[error("Unable to fetch tracking information. Please try again later.")]
    Tracking,
}

/// The carrier-rate backend.
#[async_trait]
pub trait ShippingProvider: Send + Sync {
    /// Quote rates for a parcel, sorted ascending by price.
    async fn quote(&self, to: &Address, parcel: &Parcel) -> Result<Vec<RateQuote>, ShippingError>;

    /// Verify and standardize an address.
    async fn verify_address(&self, address: &Address)
        -> Result<AddressVerification, ShippingError>;

    /// Purchase a label using a previously quoted rate.
    async fn purchase(
        &self,
        to: &Address,
        parcel: &Parcel,
        rate_id: &str,
    ) -> Result<Shipment, ShippingError>;

    /// Fetch live tracking state.
    async fn track(
        &self,
        tracking_number: &str,
        carrier: &str,
    ) -> Result<TrackingStatus, ShippingError>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_parcel_dimensions() {
        let parcel = Parcel::standard(32.0);
        assert_eq!(parcel.length, 6.0);
        assert_eq!(parcel.width, 4.0);
        assert_eq!(parcel.height, 2.0);
        assert_eq!(parcel.weight_oz, 32.0);
    }

    #[test]
    fn shipping_errors_are_user_safe() {
        // No variant leaks backend detail in its Display text.
        let messages = [
            ShippingError::Rates.to_string(),
            ShippingError::Purchase.to_string(),
            ShippingError::Tracking.to_string(),
        ];
        for msg in messages {
            assert!(!msg.contains("http"));
            assert!(!msg.contains("key"));
        }
        assert_eq!(
            ShippingError::Purchase.to_string(),
            "Unable to purchase shipping label. The rate may have expired."
        );
    }

    #[test]
    fn address_defaults() {
        let addr = Address::new("Alice", "1 Main St", "Austin", "TX", "78701");
        assert_eq!(addr.country, "US");
        assert_eq!(addr.street2, "");
    }
}
