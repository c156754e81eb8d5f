//! Shipping module - carrier-rate backend types and providers
//!
//! Defines the shipping domain model (addresses, parcels, rate quotes,
//! shipments, tracking) and the `ShippingProvider` seam the tool executor
//! calls through. `MockShippingProvider` is a deterministic in-process
//! backend used for tests and offline mode.

mod mock;
mod types;

pub use mock::MockShippingProvider;
pub use types::{
    Address, AddressVerification, Parcel, RateQuote, Shipment, ShippingError, ShippingProvider,
    TrackingEvent, TrackingStatus,
};
