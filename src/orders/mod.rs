//! Orders module - order book and customer context
//!
//! `OrderBook` is the persistence collaborator for orders and shipment
//! records: unfulfilled-order queries with search and limit, status
//! transitions on purchase, and shipment lookup by order or tracking
//! number. The in-memory implementation is seeded with demo data; the
//! query surface matches what a durable backend would expose.

mod context;

pub use context::{CustomerContext, PlanTier};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::shipping::Shipment;

/// Fulfillment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Unfulfilled,
    Shipped,
}

/// A merchant order awaiting shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub order_number: String,
    pub recipient: String,
    pub street: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub item_count: u32,
    pub weight_oz: f64,
    pub created_at: NaiveDate,
    pub status: OrderStatus,
}

/// A purchased shipment linked back to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub order_id: Option<String>,
    pub shipment: Shipment,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
struct BookInner {
    orders: Vec<Order>,
    shipments: Vec<ShipmentRecord>,
}

/// In-memory order and shipment store.
///
/// Safe to share across tasks; all access goes through an async RwLock.
pub struct OrderBook {
    inner: RwLock<BookInner>,
}

impl OrderBook {
    /// Empty order book.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BookInner::default()),
        }
    }

    /// Order book seeded with the demo data set.
    pub fn demo() -> Self {
        Self {
            inner: RwLock::new(BookInner {
                orders: demo_orders(),
                shipments: Vec::new(),
            }),
        }
    }

    /// Unfulfilled orders, optionally filtered by a case-insensitive
    /// substring search over order number, recipient, city, and state.
    /// Results are capped at `limit`.
    pub async fn list_unfulfilled(&self, limit: usize, search: Option<&str>) -> Vec<Order> {
        let needle = search.map(|s| s.to_lowercase());
        let inner = self.inner.read().await;
        inner
            .orders
            .iter()
            .filter(|o| o.status == OrderStatus::Unfulfilled)
            .filter(|o| match &needle {
                Some(n) => {
                    o.order_number.to_lowercase().contains(n)
                        || o.recipient.to_lowercase().contains(n)
                        || o.city.to_lowercase().contains(n)
                        || o.state.to_lowercase().contains(n)
                }
                None => true,
            })
            .take(limit)
            .cloned()
            .collect()
    }

    /// Unfulfilled orders matching the given ids, in book order.
    pub async fn get_unfulfilled_by_ids(&self, ids: &[String]) -> Vec<Order> {
        let inner = self.inner.read().await;
        inner
            .orders
            .iter()
            .filter(|o| o.status == OrderStatus::Unfulfilled && ids.contains(&o.order_id))
            .cloned()
            .collect()
    }

    /// Flip an order to shipped. Returns false if the order is unknown.
    pub async fn mark_shipped(&self, order_id: &str) -> bool {
        let mut inner = self.inner.write().await;
        match inner.orders.iter_mut().find(|o| o.order_id == order_id) {
            Some(order) => {
                order.status = OrderStatus::Shipped;
                true
            }
            None => false,
        }
    }

    /// Record a purchased shipment.
    pub async fn record_shipment(&self, order_id: Option<String>, shipment: Shipment) {
        let mut inner = self.inner.write().await;
        inner.shipments.push(ShipmentRecord {
            order_id,
            shipment,
            created_at: Utc::now(),
        });
    }

    /// Most recent shipment for an order, if any.
    pub async fn shipment_by_order(&self, order_id: &str) -> Option<ShipmentRecord> {
        let inner = self.inner.read().await;
        inner
            .shipments
            .iter()
            .rev()
            .find(|r| r.order_id.as_deref() == Some(order_id))
            .cloned()
    }

    /// Shipment with the given tracking number, if any.
    pub async fn shipment_by_tracking(&self, tracking_number: &str) -> Option<ShipmentRecord> {
        let inner = self.inner.read().await;
        inner
            .shipments
            .iter()
            .find(|r| r.shipment.tracking_number == tracking_number)
            .cloned()
    }

    pub async fn shipment_count(&self) -> usize {
        self.inner.read().await.shipments.len()
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// The demo order set used in mock mode.
fn demo_orders() -> Vec<Order> {
    let rows: &[(&str, &str, &str, &str, &str, u32, f64, (i32, u32, u32))] = &[
        ("ORD-1001", "Alice Johnson", "Los Angeles", "CA", "90001", 2, 24.0, (2025, 1, 3)),
        ("ORD-1002", "Bob Smith", "Austin", "TX", "78701", 1, 8.0, (2025, 1, 4)),
        ("ORD-1003", "Carol Williams", "Seattle", "WA", "98101", 3, 48.0, (2025, 1, 4)),
        ("ORD-1004", "David Brown", "Miami", "FL", "33101", 1, 12.0, (2025, 1, 5)),
        ("ORD-1005", "Eve Martinez", "Denver", "CO", "80201", 4, 64.0, (2025, 1, 5)),
        ("ORD-1006", "Frank Garcia", "San Francisco", "CA", "94102", 2, 32.0, (2025, 1, 5)),
        ("ORD-1007", "Grace Lee", "New York", "NY", "10001", 1, 6.0, (2025, 1, 6)),
        ("ORD-1008", "Henry Wilson", "Chicago", "IL", "60601", 5, 80.0, (2025, 1, 6)),
    ];
    rows.iter()
        .map(
            |&(id, recipient, city, state, zip, items, weight, (y, m, d))| Order {
                order_id: id.to_string(),
                order_number: format!("#{}", &id[4..]),
                recipient: recipient.to_string(),
                street: None,
                city: city.to_string(),
                state: state.to_string(),
                zip: zip.to_string(),
                item_count: items,
                weight_oz: weight,
                created_at: date(y, m, d),
                status: OrderStatus::Unfulfilled,
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_shipment(tracking: &str) -> Shipment {
        Shipment {
            id: "shp_1".to_string(),
            tracking_number: tracking.to_string(),
            label_url: "https://example.com/labels/shp_1.pdf".to_string(),
            carrier: "USPS".to_string(),
            service: "Priority Mail".to_string(),
            price: 12.50,
        }
    }

    #[tokio::test]
    async fn demo_seed_has_eight_unfulfilled_orders() {
        let book = OrderBook::demo();
        let orders = book.list_unfulfilled(20, None).await;
        assert_eq!(orders.len(), 8);
        assert_eq!(orders[0].order_number, "#1001");
        assert!(orders.iter().all(|o| o.status == OrderStatus::Unfulfilled));
    }

    #[tokio::test]
    async fn search_is_case_insensitive_across_fields() {
        let book = OrderBook::demo();
        // Recipient name
        let orders = book.list_unfulfilled(20, Some("alice")).await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "ORD-1001");
        // State
        let orders = book.list_unfulfilled(20, Some("TX")).await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "ORD-1002");
        // City substring
        let orders = book.list_unfulfilled(20, Some("francisco")).await;
        assert_eq!(orders.len(), 1);
        // No match
        let orders = book.list_unfulfilled(20, Some("nonexistent-xyz")).await;
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn limit_caps_results() {
        let book = OrderBook::demo();
        let orders = book.list_unfulfilled(3, None).await;
        assert_eq!(orders.len(), 3);
    }

    #[tokio::test]
    async fn mark_shipped_removes_from_unfulfilled() {
        let book = OrderBook::demo();
        assert!(book.mark_shipped("ORD-1002").await);
        let orders = book.list_unfulfilled(20, None).await;
        assert_eq!(orders.len(), 7);
        assert!(!orders.iter().any(|o| o.order_id == "ORD-1002"));
        assert!(!book.mark_shipped("ORD-9999").await);
    }

    #[tokio::test]
    async fn shipment_lookup_by_order_and_tracking() {
        let book = OrderBook::demo();
        book.record_shipment(Some("ORD-1001".to_string()), mock_shipment("9412345678"))
            .await;

        let by_order = book.shipment_by_order("ORD-1001").await.unwrap();
        assert_eq!(by_order.shipment.tracking_number, "9412345678");

        let by_tracking = book.shipment_by_tracking("9412345678").await.unwrap();
        assert_eq!(by_tracking.order_id.as_deref(), Some("ORD-1001"));

        assert!(book.shipment_by_order("ORD-1002").await.is_none());
    }

    #[tokio::test]
    async fn get_unfulfilled_by_ids_skips_shipped() {
        let book = OrderBook::demo();
        book.mark_shipped("ORD-1001").await;
        let ids = vec!["ORD-1001".to_string(), "ORD-1002".to_string()];
        let orders = book.get_unfulfilled_by_ids(&ids).await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "ORD-1002");
    }
}
