//! Deterministic in-process shipping provider
//!
//! Generates realistic rates from a fixed carrier/service table without
//! touching the network. Identifiers come from a monotonic counter, so
//! test runs are reproducible. Quoted rate ids are remembered, which lets
//! `purchase` return the carrier, service, and price that were actually
//! quoted rather than inventing new ones.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::types::{
    Address, AddressVerification, Parcel, RateQuote, Shipment, ShippingError, ShippingProvider,
    TrackingEvent, TrackingStatus,
};

/// Carrier, service, min transit days, max transit days.
const CARRIERS: &[(&str, &str, u32, u32)] = &[
    ("USPS", "Ground Advantage", 5, 7),
    ("USPS", "Priority Mail", 2, 3),
    ("USPS", "Priority Mail Express", 1, 2),
    ("UPS", "Ground", 4, 5),
    ("UPS", "3 Day Select", 3, 3),
    ("UPS", "2nd Day Air", 2, 2),
    ("UPS", "Next Day Air", 1, 1),
    ("FedEx", "Ground", 4, 5),
    ("FedEx", "Express Saver", 3, 3),
    ("FedEx", "2Day", 2, 2),
    ("FedEx", "Priority Overnight", 1, 1),
];

const WEST_COAST: &[&str] = &["CA", "WA", "OR", "NV", "AZ"];
const EAST_COAST: &[&str] = &["NY", "NJ", "MA", "CT", "PA", "VA", "MD", "FL"];

#[derive(Default)]
struct MockState {
    counter: u64,
    /// rate_id -> quote, so purchase can honor what was quoted
    quoted: HashMap<String, RateQuote>,
}

impl MockState {
    fn next(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }
}

/// Mock shipping backend for tests and offline mode.
pub struct MockShippingProvider {
    state: Mutex<MockState>,
}

impl MockShippingProvider {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    fn tracking_prefix(carrier: &str) -> &'static str {
        match carrier {
            "UPS" => "1Z",
            "FedEx" => "78",
            _ => "94",
        }
    }
}

impl Default for MockShippingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShippingProvider for MockShippingProvider {
    async fn quote(&self, to: &Address, parcel: &Parcel) -> Result<Vec<RateQuote>, ShippingError> {
        let weight_lb = parcel.weight_oz / 16.0;
        let base_cost = 5.0 + weight_lb * 0.5;

        let state = to.state.to_uppercase();
        let distance_factor = if WEST_COAST.contains(&state.as_str()) {
            1.5
        } else if EAST_COAST.contains(&state.as_str()) {
            1.0
        } else {
            1.25
        };

        let mut inner = self.state.lock().await;
        let mut rates = Vec::with_capacity(CARRIERS.len());
        for &(carrier, service, min_days, max_days) in CARRIERS {
            // Faster service costs more.
            let speed_factor = 1.0 / min_days as f64;
            let mut price = base_cost * distance_factor * (1.0 + speed_factor);
            price *= match carrier {
                "UPS" => 1.1,
                "FedEx" => 1.15,
                _ => 1.0,
            };

            rates.push(RateQuote {
                carrier: carrier.to_string(),
                service: service.to_string(),
                price: (price * 100.0).round() / 100.0,
                delivery_days: Some(max_days),
                rate_id: format!("rate_{}", 10000 + inner.next()),
            });
        }

        rates.sort_by(|a, b| a.price.total_cmp(&b.price));
        for rate in &rates {
            inner.quoted.insert(rate.rate_id.clone(), rate.clone());
        }

        debug!(zip = %to.zip_code, weight_oz = parcel.weight_oz, "quoted {} mock rates", rates.len());
        Ok(rates)
    }

    async fn verify_address(
        &self,
        address: &Address,
    ) -> Result<AddressVerification, ShippingError> {
        // Standardize: uppercase, 5-digit zip.
        let zip = address
            .zip_code
            .split('-')
            .next()
            .unwrap_or(&address.zip_code)
            .to_string();
        let standardized = Address {
            name: address.name.to_uppercase(),
            street1: address.street1.to_uppercase(),
            street2: address.street2.to_uppercase(),
            city: address.city.to_uppercase(),
            state: address.state.to_uppercase(),
            zip_code: zip,
            country: "US".to_string(),
            phone: address.phone.clone(),
        };
        Ok(AddressVerification {
            valid: true,
            standardized: Some(standardized),
            message: "Address is valid".to_string(),
        })
    }

    async fn purchase(
        &self,
        _to: &Address,
        _parcel: &Parcel,
        rate_id: &str,
    ) -> Result<Shipment, ShippingError> {
        let mut inner = self.state.lock().await;
        let Some(quote) = inner.quoted.get(rate_id).cloned() else {
            warn!(rate_id, "purchase attempted with unknown rate id");
            return Err(ShippingError::Purchase);
        };

        let n = inner.next();
        let id = format!("shp_{}", 10000 + n);
        let tracking_number = format!(
            "{}{:09}",
            Self::tracking_prefix(&quote.carrier),
            100_000_000 + n
        );

        Ok(Shipment {
            label_url: format!("https://example.com/labels/{}.pdf", id),
            id,
            tracking_number,
            carrier: quote.carrier,
            service: quote.service,
            price: quote.price,
        })
    }

    async fn track(
        &self,
        _tracking_number: &str,
        _carrier: &str,
    ) -> Result<TrackingStatus, ShippingError> {
        let now = Utc::now();
        Ok(TrackingStatus {
            status: "in_transit".to_string(),
            estimated_delivery: Some((now + Duration::days(3)).format("%Y-%m-%d").to_string()),
            events: vec![
                TrackingEvent {
                    status: "in_transit".to_string(),
                    message: "Package in transit to destination".to_string(),
                    location: Some("Chicago, IL".to_string()),
                    timestamp: Some(now - Duration::hours(20)),
                },
                TrackingEvent {
                    status: "accepted".to_string(),
                    message: "Package accepted at origin facility".to_string(),
                    location: Some("New York, NY".to_string()),
                    timestamp: Some(now - Duration::hours(44)),
                },
            ],
        })
    }

    fn name(&self) -> &str {
        "mock-shipping"
    }
}
