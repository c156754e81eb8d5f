//! Tool execution
//!
//! `ToolExecutor` is the single trust boundary between model-issued
//! intent and real-world side effects. Its `execute` contract is that it
//! always returns a rendered string and never fails: the agent loop must
//! always have a turn-ending string to hand back to the model, or the
//! tool-calling protocol deadlocks. Internally every operation is typed
//! and every failure path is converted to user-safe text here.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::orders::{CustomerContext, Order, OrderBook};
use crate::rates::{RateCache, RateLookup};
use crate::shipping::{Address, Parcel, RateQuote, Shipment, ShippingProvider};

use super::call::{
    BulkShipArgs, CreateShipmentArgs, GetRatesArgs, GetTrackingArgs, ListOrdersArgs, ToolCall,
    ToolParseError, ValidateAddressArgs,
};

/// Infer a carrier from a tracking number prefix.
pub fn infer_carrier(tracking_number: &str) -> &'static str {
    if tracking_number.starts_with("1Z") {
        "UPS"
    } else if tracking_number.starts_with("78") {
        "FedEx"
    } else {
        // "94" and anything unrecognized
        "USPS"
    }
}

/// Executes model-issued tool calls against the shipping backend.
pub struct ToolExecutor {
    shipping: Arc<dyn ShippingProvider>,
    orders: Arc<OrderBook>,
    context: CustomerContext,
    rates: RateCache,
}

impl ToolExecutor {
    pub fn new(
        shipping: Arc<dyn ShippingProvider>,
        orders: Arc<OrderBook>,
        context: CustomerContext,
    ) -> Self {
        Self {
            shipping,
            orders,
            context,
            rates: RateCache::new(),
        }
    }

    pub fn context(&self) -> &CustomerContext {
        &self.context
    }

    /// Execute a tool call and render the result.
    ///
    /// Never fails: malformed input, unknown tools, and backend errors
    /// all come back as human-readable text.
    pub async fn execute(&mut self, tool_name: &str, input: Value) -> String {
        let call = match ToolCall::parse(tool_name, input) {
            Ok(call) => call,
            Err(err) => {
                warn!(tool = tool_name, %err, "rejected tool input");
                return match err {
                    ToolParseError::UnknownTool(name) => format!("Unknown tool: {}", name),
                    other => other.to_string(),
                };
            }
        };

        match call {
            ToolCall::GetShippingRates(args) => self.get_rates(args).await,
            ToolCall::ValidateAddress(args) => self.validate_address(args).await,
            ToolCall::CreateShipment(args) => self.create_shipment(args).await,
            ToolCall::GetTrackingStatus(args) => self.get_tracking(args).await,
            ToolCall::GetUnfulfilledOrders(args) => self.list_orders(args).await,
            ToolCall::BulkShipOrders(args) => self.bulk_ship(args).await,
        }
    }

    async fn get_rates(&mut self, args: GetRatesArgs) -> String {
        let to = Address {
            name: args.to_name.unwrap_or_else(|| "Recipient".to_string()),
            street1: args.to_street.unwrap_or_default(),
            ..Address::new("", "", args.to_city, args.to_state, args.to_zip.clone())
        };
        let parcel = Parcel {
            length: args.length,
            width: args.width,
            height: args.height,
            weight_oz: args.weight_oz,
        };

        let mut rates = match self.shipping.quote(&to, &parcel).await {
            Ok(rates) => rates,
            Err(err) => {
                error!(zip = %args.to_zip, %err, "rate quote failed");
                return format!("Error getting rates: {}", err);
            }
        };
        if rates.is_empty() {
            return "No rates available for this shipment.".to_string();
        }

        // Ascending by price; stable sort preserves backend order on ties.
        rates.sort_by(|a, b| a.price.total_cmp(&b.price));
        self.rates.put(&args.to_zip, args.weight_oz, rates.clone());

        let mut lines = vec![
            "Available shipping rates (sorted by price):".to_string(),
            String::new(),
        ];
        for (i, rate) in rates.iter().take(10).enumerate() {
            let days = match rate.delivery_days {
                Some(d) => format!("{} days", d),
                None => "varies".to_string(),
            };
            lines.push(format!(
                "{}. {} {}: ${:.2} ({}) [rate_id: {}]",
                i + 1,
                rate.carrier,
                rate.service,
                rate.price,
                days,
                rate.rate_id
            ));
        }
        lines.join("\n")
    }

    async fn validate_address(&self, args: ValidateAddressArgs) -> String {
        let address = Address {
            name: args.name.unwrap_or_default(),
            ..Address::new("", args.street, args.city, args.state, args.zip)
        };

        match self.shipping.verify_address(&address).await {
            Ok(result) => match (result.valid, result.standardized) {
                (true, Some(corrected)) => format!(
                    "Address is valid.\nStandardized: {}, {}, {} {}",
                    corrected.street1, corrected.city, corrected.state, corrected.zip_code
                ),
                // Invalid address is a normal outcome, not an error.
                _ => format!("Address validation failed: {}", result.message),
            },
            Err(err) => {
                error!(%err, "address verification call failed");
                format!("Error validating address: {}", err)
            }
        }
    }

    async fn create_shipment(&mut self, args: CreateShipmentArgs) -> String {
        let mut warnings = Vec::new();

        // The rate must come from a previous quote; if it cannot be
        // resolved at all, stop before spending money.
        match self.rates.resolve(&args.rate_id) {
            RateLookup::NotFound { message } | RateLookup::Expired { message } => return message,
            RateLookup::Found { warning, .. } => {
                if let Some(w) = warning {
                    warnings.push(w);
                }
            }
        }

        // Soft consistency check: proceed on mismatch, but surface it.
        if let Some(entry) = self.rates.entry_for(&args.rate_id) {
            if entry.destination_zip != args.to_zip {
                warnings.push(format!(
                    "Warning: Destination ZIP changed from {} to {} since rates were fetched.",
                    entry.destination_zip, args.to_zip
                ));
            }
            if (entry.weight_oz - args.weight_oz).abs() > 0.1 {
                warnings.push(format!(
                    "Warning: Package weight changed from {}oz to {}oz since rates were fetched.",
                    entry.weight_oz, args.weight_oz
                ));
            }
        }

        let to = Address::new(
            args.to_name,
            args.to_street,
            args.to_city,
            args.to_state,
            args.to_zip,
        );
        let parcel = Parcel {
            length: args.length,
            width: args.width,
            height: args.height,
            weight_oz: args.weight_oz,
        };

        let shipment = match self.shipping.purchase(&to, &parcel, &args.rate_id).await {
            Ok(shipment) => shipment,
            Err(err) => {
                error!(rate_id = %args.rate_id, %err, "label purchase failed");
                return format!("Error creating shipment: {}", err);
            }
        };

        // The shipment id doubles as an idempotency key for a durable
        // backend reconciling this write.
        self.orders
            .record_shipment(args.order_id.clone(), shipment.clone())
            .await;
        if let Some(order_id) = &args.order_id {
            self.orders.mark_shipped(order_id).await;
        }
        self.context.increment_labels(1);
        info!(
            tracking = %shipment.tracking_number,
            carrier = %shipment.carrier,
            "label purchased"
        );

        let mut lines = vec![
            "Shipment created successfully!".to_string(),
            format!("Tracking Number: {}", shipment.tracking_number),
            format!("Carrier: {} {}", shipment.carrier, shipment.service),
            format!("Cost: ${:.2}", shipment.price),
            format!("Label URL: {}", shipment.label_url),
        ];
        if !warnings.is_empty() {
            lines.push(String::new());
            lines.extend(warnings);
        }
        lines.join("\n")
    }

    async fn get_tracking(&self, args: GetTrackingArgs) -> String {
        if args.tracking_number.is_none() && args.order_id.is_none() {
            return "Error: Please provide either tracking_number or order_id".to_string();
        }

        let mut carrier: Option<String> = None;
        let tracking_number = match (&args.tracking_number, &args.order_id) {
            (Some(number), _) => {
                if let Some(record) = self.orders.shipment_by_tracking(number).await {
                    carrier = Some(record.shipment.carrier);
                }
                number.clone()
            }
            (None, Some(order_id)) => match self.orders.shipment_by_order(order_id).await {
                Some(record) => {
                    carrier = Some(record.shipment.carrier);
                    record.shipment.tracking_number
                }
                None => {
                    return format!(
                        "No shipment found for order {}. The order may not have been shipped yet.",
                        order_id
                    )
                }
            },
            (None, None) => unreachable!("guarded above"),
        };

        let carrier = carrier.unwrap_or_else(|| infer_carrier(&tracking_number).to_string());

        let status = match self.shipping.track(&tracking_number, &carrier).await {
            Ok(status) => status,
            Err(err) => {
                error!(%tracking_number, %err, "tracking fetch failed");
                return format!("Error getting tracking info: {}", err);
            }
        };

        let mut lines = vec![
            format!("Tracking: {}", tracking_number),
            format!("Status: {}", title_case(&status.status)),
        ];
        if let Some(eta) = &status.estimated_delivery {
            lines.push(format!("Estimated Delivery: {}", eta));
        }
        if !status.events.is_empty() {
            lines.push(String::new());
            lines.push("Recent Events:".to_string());
            for event in status.events.iter().take(5) {
                let when = event
                    .timestamp
                    .map(|t| t.format("%b %d, %I:%M %p").to_string())
                    .unwrap_or_default();
                lines.push(format!("  - {}: {}", when, event.message));
                if let Some(location) = &event.location {
                    lines.push(format!("    Location: {}", location));
                }
            }
        }
        lines.join("\n")
    }

    async fn list_orders(&self, args: ListOrdersArgs) -> String {
        let search = args.search.as_deref().filter(|s| !s.is_empty());
        let orders = self.orders.list_unfulfilled(args.limit, search).await;

        if orders.is_empty() {
            return match search {
                Some(s) => format!("No unfulfilled orders found matching '{}'.", s),
                None => "No unfulfilled orders found.".to_string(),
            };
        }

        let mut lines = vec![
            format!("Unfulfilled Orders ({} total):", orders.len()),
            String::new(),
        ];
        for order in &orders {
            lines.push(format!("{} - {}", order.order_number, order.recipient));
            lines.push(format!(
                "  {}, {} {} | {} item(s) | {:.1} lbs",
                order.city,
                order.state,
                order.zip,
                order.item_count,
                order.weight_oz / 16.0
            ));
            lines.push(format!("  [order_id: {}]", order.order_id));
        }
        lines.join("\n")
    }

    /// Two-phase bulk shipping.
    ///
    /// Without `confirmed`, quotes and renders a preview with zero side
    /// effects. With `confirmed`, re-resolves the candidate set, buys a
    /// label per order, and increments the label counter once by the
    /// number of successful purchases. An order that fails rate lookup
    /// is reported separately and never aborts the batch.
    async fn bulk_ship(&mut self, args: BulkShipArgs) -> String {
        let orders = self.resolve_bulk_candidates(&args).await;
        if orders.is_empty() {
            return "No orders match the specified criteria.".to_string();
        }

        let mut selections: Vec<(Order, RateQuote)> = Vec::new();
        let mut failures: Vec<(Order, String)> = Vec::new();
        let mut estimated_cost = 0.0;

        // Quote all candidates concurrently; results come back in order.
        let quotes = join_all(orders.into_iter().map(|order| {
            let shipping = Arc::clone(&self.shipping);
            async move {
                let to = bulk_address(&order);
                let parcel = Parcel::standard(order.weight_oz);
                let result = shipping.quote(&to, &parcel).await;
                (order, result)
            }
        }))
        .await;

        for (order, result) in quotes {
            match result {
                Err(err) => failures.push((order, err.to_string())),
                Ok(rates) => match select_rate(
                    &rates,
                    args.carrier.as_deref(),
                    args.service.as_deref(),
                    args.cheapest,
                ) {
                    Some(rate) => {
                        estimated_cost += rate.price;
                        selections.push((order, rate));
                    }
                    None => failures.push((order, "No rates available".to_string())),
                },
            }
        }

        if !args.confirmed {
            return render_preview(&args, &selections, &failures, estimated_cost);
        }

        let mut shipped: Vec<(Order, Shipment)> = Vec::new();
        let mut failed = failures;
        for (order, rate) in selections {
            let to = bulk_address(&order);
            let parcel = Parcel::standard(order.weight_oz);
            match self.shipping.purchase(&to, &parcel, &rate.rate_id).await {
                Ok(shipment) => {
                    self.orders
                        .record_shipment(Some(order.order_id.clone()), shipment.clone())
                        .await;
                    self.orders.mark_shipped(&order.order_id).await;
                    shipped.push((order, shipment));
                }
                Err(err) => {
                    error!(order_id = %order.order_id, %err, "bulk purchase failed");
                    failed.push((order, err.to_string()));
                }
            }
        }

        // One batched increment, not one per order.
        let labels_created = shipped.len() as u32;
        if labels_created > 0 {
            self.context.increment_labels(labels_created);
        }
        info!(shipped = shipped.len(), failed = failed.len(), "bulk shipping complete");

        render_completion(&shipped, &failed)
    }

    async fn resolve_bulk_candidates(&self, args: &BulkShipArgs) -> Vec<Order> {
        let mut orders = if args.order_ids.is_empty() {
            self.orders.list_unfulfilled(100, None).await
        } else {
            self.orders.get_unfulfilled_by_ids(&args.order_ids).await
        };

        if let Some(filter) = &args.filter {
            if let Some(max_weight) = filter.max_weight_oz {
                orders.retain(|o| o.weight_oz <= max_weight);
            }
            if let Some(state) = &filter.destination_state {
                let state = state.to_uppercase();
                orders.retain(|o| o.state.to_uppercase() == state);
            }
            if let Some(after) = &filter.created_after {
                if let Ok(after) = NaiveDate::parse_from_str(after, "%Y-%m-%d") {
                    orders.retain(|o| o.created_at >= after);
                } else {
                    warn!(created_after = %after, "ignoring unparseable date filter");
                }
            }
        }
        orders
    }
}

fn bulk_address(order: &Order) -> Address {
    Address::new(
        order.recipient.clone(),
        order.street.clone().unwrap_or_else(|| "123 Customer St".to_string()),
        order.city.clone(),
        order.state.clone(),
        order.zip.clone(),
    )
}

/// Pick a rate per the selection policy: cheapest flag wins, then
/// carrier+service match, then carrier match, then fall back to the
/// cheapest quote. Returns `None` only for an empty quote list.
fn select_rate(
    rates: &[RateQuote],
    carrier: Option<&str>,
    service: Option<&str>,
    cheapest: bool,
) -> Option<RateQuote> {
    if rates.is_empty() {
        return None;
    }
    if !cheapest {
        if let Some(carrier) = carrier {
            let found = match service {
                Some(service) => rates.iter().find(|r| {
                    r.carrier.eq_ignore_ascii_case(carrier)
                        && r.service.to_lowercase().contains(&service.to_lowercase())
                }),
                None => rates.iter().find(|r| r.carrier.eq_ignore_ascii_case(carrier)),
            };
            if let Some(rate) = found {
                return Some(rate.clone());
            }
        }
    }
    // Quotes arrive sorted ascending, so the first is the cheapest.
    rates.first().cloned()
}

fn render_preview(
    args: &BulkShipArgs,
    selections: &[(Order, RateQuote)],
    failures: &[(Order, String)],
    estimated_cost: f64,
) -> String {
    let mut lines = vec![
        "Bulk Shipping Preview:".to_string(),
        format!("Orders to ship: {}", selections.len()),
        format!("Estimated total cost: ${:.2}", estimated_cost),
        String::new(),
    ];

    if args.carrier.is_some() || args.cheapest {
        let method = match (&args.carrier, &args.service) {
            (Some(carrier), Some(service)) => format!("{} {}", carrier, service),
            (Some(carrier), None) => carrier.clone(),
            _ => "Cheapest available".to_string(),
        };
        lines.push(format!("Shipping method: {}", method));
        lines.push(String::new());
    }

    lines.push("Orders:".to_string());
    for (order, rate) in selections.iter().take(10) {
        lines.push(format!(
            "  {}: {} -> {} | ${:.2} ({})",
            order.order_number, order.recipient, order.state, rate.price, rate.carrier
        ));
    }
    if selections.len() > 10 {
        lines.push(format!("  ... and {} more orders", selections.len() - 10));
    }

    if !failures.is_empty() {
        lines.push(String::new());
        lines.push(format!("Errors ({} orders):", failures.len()));
        for (order, error) in failures {
            lines.push(format!("  {}: {}", order.order_number, error));
        }
    }

    lines.push(String::new());
    lines.push("To proceed, call bulk_ship_orders again with confirmed=true".to_string());
    lines.join("\n")
}

fn render_completion(shipped: &[(Order, Shipment)], failed: &[(Order, String)]) -> String {
    let actual_cost: f64 = shipped.iter().map(|(_, s)| s.price).sum();

    let mut lines = vec![
        "Bulk Shipping Complete!".to_string(),
        String::new(),
        format!("Successfully shipped: {} orders", shipped.len()),
        format!("Total cost: ${:.2}", actual_cost),
    ];
    if !failed.is_empty() {
        lines.push(format!("Failed: {} orders", failed.len()));
    }

    lines.push(String::new());
    lines.push("Tracking Numbers:".to_string());
    for (order, shipment) in shipped {
        lines.push(format!(
            "  {}: {} ({})",
            order.order_number, shipment.tracking_number, shipment.carrier
        ));
    }

    if !failed.is_empty() {
        lines.push(String::new());
        lines.push("Failed Orders:".to_string());
        for (order, error) in failed {
            lines.push(format!("  {}: {}", order.order_number, error));
        }
    }
    lines.join("\n")
}

/// "in_transit" -> "In Transit"
fn title_case(status: &str) -> String {
    status
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipping::MockShippingProvider;
    use serde_json::json;

    fn executor() -> ToolExecutor {
        ToolExecutor::new(
            Arc::new(MockShippingProvider::new()),
            Arc::new(OrderBook::demo()),
            CustomerContext::demo(),
        )
    }

    fn rates_input() -> Value {
        json!({"to_city": "Los Angeles", "to_state": "CA", "to_zip": "90001", "weight_oz": 32})
    }

    fn extract_first_rate_id(rendered: &str) -> String {
        let start = rendered.find("[rate_id: ").expect("rate id present") + "[rate_id: ".len();
        let end = rendered[start..].find(']').expect("closing bracket") + start;
        rendered[start..end].to_string()
    }

    #[test]
    fn infer_carrier_by_prefix() {
        assert_eq!(infer_carrier("1Z999AA10123456784"), "UPS");
        assert_eq!(infer_carrier("9412345678901234"), "USPS");
        assert_eq!(infer_carrier("7812345678"), "FedEx");
        assert_eq!(infer_carrier("XX123"), "USPS");
    }

    #[test]
    fn title_case_statuses() {
        assert_eq!(title_case("in_transit"), "In Transit");
        assert_eq!(title_case("delivered"), "Delivered");
        assert_eq!(title_case("out_for_delivery"), "Out For Delivery");
    }

    #[test]
    fn select_rate_policies() {
        let rates = vec![
            RateQuote {
                carrier: "USPS".into(),
                service: "Ground Advantage".into(),
                price: 8.45,
                delivery_days: Some(7),
                rate_id: "rate_1".into(),
            },
            RateQuote {
                carrier: "UPS".into(),
                service: "Ground".into(),
                price: 12.30,
                delivery_days: Some(5),
                rate_id: "rate_2".into(),
            },
            RateQuote {
                carrier: "UPS".into(),
                service: "2nd Day Air".into(),
                price: 18.10,
                delivery_days: Some(2),
                rate_id: "rate_3".into(),
            },
        ];

        // Cheapest flag overrides carrier preference.
        let r = select_rate(&rates, Some("UPS"), None, true).unwrap();
        assert_eq!(r.rate_id, "rate_1");
        // Carrier + service substring match.
        let r = select_rate(&rates, Some("ups"), Some("2nd day"), false).unwrap();
        assert_eq!(r.rate_id, "rate_3");
        // Carrier only: first matching.
        let r = select_rate(&rates, Some("UPS"), None, false).unwrap();
        assert_eq!(r.rate_id, "rate_2");
        // Requested carrier missing: silently falls back to cheapest.
        let r = select_rate(&rates, Some("DHL"), None, false).unwrap();
        assert_eq!(r.rate_id, "rate_1");
        assert!(select_rate(&[], Some("UPS"), None, false).is_none());
    }

    #[tokio::test]
    async fn rates_render_sorted_and_capped() {
        let mut exec = executor();
        let out = exec.execute("get_shipping_rates", rates_input()).await;
        assert!(out.starts_with("Available shipping rates (sorted by price):"));
        assert!(out.contains("1. USPS Ground Advantage"));
        assert!(out.contains("[rate_id: rate_"));
        // 11 carriers quoted, render capped at 10.
        assert!(out.contains("10. "));
        assert!(!out.contains("11. "));
    }

    #[tokio::test]
    async fn validate_address_standardizes() {
        let mut exec = executor();
        let out = exec
            .execute(
                "validate_address",
                json!({"street": "123 main st", "city": "Los Angeles", "state": "ca", "zip": "90001-1234"}),
            )
            .await;
        assert!(out.starts_with("Address is valid."));
        assert!(out.contains("Standardized: 123 MAIN ST, LOS ANGELES, CA 90001"));
    }

    #[tokio::test]
    async fn create_shipment_requires_cached_rate() {
        let mut exec = executor();
        let out = exec
            .execute(
                "create_shipment",
                json!({
                    "to_name": "Alice", "to_street": "1 Main St", "to_city": "Los Angeles",
                    "to_state": "CA", "to_zip": "90001", "weight_oz": 32, "rate_id": "rate_77777"
                }),
            )
            .await;
        assert_eq!(
            out,
            "Rate ID 'rate_77777' not found in cache. Please request new rates."
        );
        // No purchase attempted, label counter untouched.
        assert_eq!(exec.context().labels_used, 42);
    }

    #[tokio::test]
    async fn create_shipment_happy_path_increments_labels() {
        let mut exec = executor();
        let rendered = exec.execute("get_shipping_rates", rates_input()).await;
        let rate_id = extract_first_rate_id(&rendered);

        let out = exec
            .execute(
                "create_shipment",
                json!({
                    "to_name": "Alice", "to_street": "1 Main St", "to_city": "Los Angeles",
                    "to_state": "CA", "to_zip": "90001", "weight_oz": 32, "rate_id": rate_id
                }),
            )
            .await;
        assert!(out.starts_with("Shipment created successfully!"));
        assert!(out.contains("Tracking Number: "));
        assert!(out.contains("Label URL: "));
        assert!(!out.contains("Warning"));
        assert_eq!(exec.context().labels_used, 43);
    }

    #[tokio::test]
    async fn create_shipment_warns_on_parameter_mismatch() {
        let mut exec = executor();
        let rendered = exec.execute("get_shipping_rates", rates_input()).await;
        let rate_id = extract_first_rate_id(&rendered);

        // Different zip and weight than quoted: purchase proceeds,
        // discrepancies are surfaced.
        let out = exec
            .execute(
                "create_shipment",
                json!({
                    "to_name": "Alice", "to_street": "1 Main St", "to_city": "Austin",
                    "to_state": "TX", "to_zip": "78701", "weight_oz": 48, "rate_id": rate_id
                }),
            )
            .await;
        assert!(out.starts_with("Shipment created successfully!"));
        assert!(out.contains("Warning: Destination ZIP changed from 90001 to 78701"));
        assert!(out.contains("Warning: Package weight changed from 32oz to 48oz"));
        assert_eq!(exec.context().labels_used, 43);
    }

    #[tokio::test]
    async fn tracking_requires_an_identifier() {
        let mut exec = executor();
        let out = exec.execute("get_tracking_status", json!({})).await;
        assert_eq!(out, "Error: Please provide either tracking_number or order_id");
    }

    #[tokio::test]
    async fn tracking_by_unshipped_order() {
        let mut exec = executor();
        let out = exec
            .execute("get_tracking_status", json!({"order_id": "ORD-1003"}))
            .await;
        assert_eq!(
            out,
            "No shipment found for order ORD-1003. The order may not have been shipped yet."
        );
    }

    #[tokio::test]
    async fn tracking_renders_status_and_events() {
        let mut exec = executor();
        let out = exec
            .execute(
                "get_tracking_status",
                json!({"tracking_number": "9412345678901"}),
            )
            .await;
        assert!(out.contains("Tracking: 9412345678901"));
        assert!(out.contains("Status: In Transit"));
        assert!(out.contains("Recent Events:"));
        assert!(out.contains("Location: Chicago, IL"));
    }

    #[tokio::test]
    async fn list_orders_renders_and_searches() {
        let mut exec = executor();
        let out = exec.execute("get_unfulfilled_orders", json!({})).await;
        assert!(out.starts_with("Unfulfilled Orders (8 total):"));
        assert!(out.contains("#1001 - Alice Johnson"));
        assert!(out.contains("  Los Angeles, CA 90001 | 2 item(s) | 1.5 lbs"));
        assert!(out.contains("[order_id: ORD-1001]"));

        let out = exec
            .execute("get_unfulfilled_orders", json!({"search": "nonexistent-xyz"}))
            .await;
        assert_eq!(out, "No unfulfilled orders found matching 'nonexistent-xyz'.");
    }

    #[tokio::test]
    async fn bulk_preview_has_no_side_effects() {
        let mut exec = executor();
        let before_labels = exec.context().labels_used;

        let out = exec
            .execute(
                "bulk_ship_orders",
                json!({"filter": {"max_weight_oz": 16}, "cheapest": true}),
            )
            .await;
        assert!(out.starts_with("Bulk Shipping Preview:"));
        // Only the three orders at or under 16oz: #1002, #1004, #1007.
        assert!(out.contains("Orders to ship: 3"));
        assert!(out.contains("#1002"));
        assert!(!out.contains("#1001"));
        assert!(out.contains("Shipping method: Cheapest available"));
        assert!(out.contains("To proceed, call bulk_ship_orders again with confirmed=true"));

        assert_eq!(exec.context().labels_used, before_labels);
        assert_eq!(exec.orders.shipment_count().await, 0);

        // Preview twice in a row: still no side effects, same shape.
        let again = exec
            .execute(
                "bulk_ship_orders",
                json!({"filter": {"max_weight_oz": 16}, "cheapest": true}),
            )
            .await;
        assert!(again.contains("Orders to ship: 3"));
        assert_eq!(exec.context().labels_used, before_labels);
        assert_eq!(exec.orders.shipment_count().await, 0);
    }

    #[tokio::test]
    async fn bulk_confirmed_ships_and_batch_increments() {
        let mut exec = executor();
        let before_labels = exec.context().labels_used;

        let out = exec
            .execute(
                "bulk_ship_orders",
                json!({"filter": {"destination_state": "CA"}, "cheapest": true, "confirmed": true}),
            )
            .await;
        assert!(out.starts_with("Bulk Shipping Complete!"));
        assert!(out.contains("Successfully shipped: 2 orders"));
        assert!(out.contains("Tracking Numbers:"));
        assert!(out.contains("#1001:"));
        assert!(out.contains("#1006:"));

        assert_eq!(exec.context().labels_used, before_labels + 2);
        assert_eq!(exec.orders.shipment_count().await, 2);

        // The shipped orders left the unfulfilled set.
        let remaining = exec.orders.list_unfulfilled(20, None).await;
        assert_eq!(remaining.len(), 6);
    }

    #[tokio::test]
    async fn bulk_with_no_matches() {
        let mut exec = executor();
        let out = exec
            .execute(
                "bulk_ship_orders",
                json!({"filter": {"destination_state": "HI"}}),
            )
            .await;
        assert_eq!(out, "No orders match the specified criteria.");
    }

    #[tokio::test]
    async fn bulk_created_after_filter() {
        let mut exec = executor();
        let out = exec
            .execute(
                "bulk_ship_orders",
                json!({"filter": {"created_after": "2025-01-06"}, "cheapest": true}),
            )
            .await;
        // #1007 and #1008 were created on 2025-01-06.
        assert!(out.contains("Orders to ship: 2"));
    }

    #[tokio::test]
    async fn executor_never_fails_on_malformed_input() {
        let mut exec = executor();
        let cases = [
            ("get_shipping_rates", json!({})),
            ("get_shipping_rates", json!({"to_city": 5})),
            ("validate_address", json!({"street": "x"})),
            ("create_shipment", json!({"weight_oz": "heavy"})),
            ("get_tracking_status", json!({})),
            ("get_unfulfilled_orders", json!({"limit": "many"})),
            ("bulk_ship_orders", json!({"confirmed": "yes"})),
        ];
        for (tool, input) in cases {
            let out = exec.execute(tool, input).await;
            assert!(
                out.contains("Error") || out.contains("error"),
                "tool {} returned non-error for malformed input: {}",
                tool,
                out
            );
        }
        let out = exec.execute("warp_drive", json!({})).await;
        assert_eq!(out, "Unknown tool: warp_drive");
    }
}
