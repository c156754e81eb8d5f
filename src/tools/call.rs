//! Typed tool calls
//!
//! The six tools the model may invoke form a closed enum. Each variant
//! carries its own argument struct, so dispatch is an exhaustive match
//! and an unknown tool name can never reach execution silently. Parsing
//! failures are reported with the offending field name.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

fn default_length() -> f64 {
    6.0
}
fn default_width() -> f64 {
    4.0
}
fn default_height() -> f64 {
    2.0
}
fn default_limit() -> usize {
    20
}

/// Arguments for `get_shipping_rates`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetRatesArgs {
    pub to_name: Option<String>,
    pub to_street: Option<String>,
    pub to_city: String,
    pub to_state: String,
    pub to_zip: String,
    pub weight_oz: f64,
    #[serde(default = "default_length")]
    pub length: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
}

/// Arguments for `validate_address`.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateAddressArgs {
    pub name: Option<String>,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Arguments for `create_shipment`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShipmentArgs {
    pub to_name: String,
    pub to_street: String,
    pub to_city: String,
    pub to_state: String,
    pub to_zip: String,
    pub weight_oz: f64,
    #[serde(default = "default_length")]
    pub length: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    pub rate_id: String,
    pub order_id: Option<String>,
}

/// Arguments for `get_tracking_status`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetTrackingArgs {
    pub tracking_number: Option<String>,
    pub order_id: Option<String>,
}

/// Arguments for `get_unfulfilled_orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListOrdersArgs {
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub search: Option<String>,
}

/// Order filter for `bulk_ship_orders`, used instead of explicit ids.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkFilter {
    pub max_weight_oz: Option<f64>,
    pub destination_state: Option<String>,
    /// Inclusive lower bound, YYYY-MM-DD
    pub created_after: Option<String>,
}

/// Arguments for `bulk_ship_orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkShipArgs {
    #[serde(default)]
    pub order_ids: Vec<String>,
    pub filter: Option<BulkFilter>,
    pub carrier: Option<String>,
    pub service: Option<String>,
    #[serde(default)]
    pub cheapest: bool,
    #[serde(default)]
    pub confirmed: bool,
}

/// One of the six tools, with parsed arguments.
#[derive(Debug, Clone)]
pub enum ToolCall {
    GetShippingRates(GetRatesArgs),
    ValidateAddress(ValidateAddressArgs),
    CreateShipment(CreateShipmentArgs),
    GetTrackingStatus(GetTrackingArgs),
    GetUnfulfilledOrders(ListOrdersArgs),
    BulkShipOrders(BulkShipArgs),
}

/// Why a `(name, input)` pair failed to parse into a `ToolCall`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolParseError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Error: Missing required field '{field}' for tool '{tool}'")]
    MissingField { tool: String, field: String },

    #[error("Error: Invalid input for tool '{tool}': {detail}")]
    Invalid { tool: String, detail: String },
}

impl ToolCall {
    /// Parse a model-issued tool invocation into a typed call.
    pub fn parse(name: &str, input: Value) -> Result<Self, ToolParseError> {
        match name {
            "get_shipping_rates" => from_value(name, input).map(ToolCall::GetShippingRates),
            "validate_address" => from_value(name, input).map(ToolCall::ValidateAddress),
            "create_shipment" => from_value(name, input).map(ToolCall::CreateShipment),
            "get_tracking_status" => from_value(name, input).map(ToolCall::GetTrackingStatus),
            "get_unfulfilled_orders" => from_value(name, input).map(ToolCall::GetUnfulfilledOrders),
            "bulk_ship_orders" => from_value(name, input).map(ToolCall::BulkShipOrders),
            other => Err(ToolParseError::UnknownTool(other.to_string())),
        }
    }

    /// The wire name of this tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::GetShippingRates(_) => "get_shipping_rates",
            ToolCall::ValidateAddress(_) => "validate_address",
            ToolCall::CreateShipment(_) => "create_shipment",
            ToolCall::GetTrackingStatus(_) => "get_tracking_status",
            ToolCall::GetUnfulfilledOrders(_) => "get_unfulfilled_orders",
            ToolCall::BulkShipOrders(_) => "bulk_ship_orders",
        }
    }
}

fn from_value<T: serde::de::DeserializeOwned>(
    tool: &str,
    input: Value,
) -> Result<T, ToolParseError> {
    serde_json::from_value(input).map_err(|e| {
        let detail = e.to_string();
        // serde reports absent required fields as "missing field `x`".
        match detail
            .strip_prefix("missing field `")
            .and_then(|rest| rest.split('`').next())
        {
            Some(field) => ToolParseError::MissingField {
                tool: tool.to_string(),
                field: field.to_string(),
            },
            None => ToolParseError::Invalid {
                tool: tool.to_string(),
                detail,
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_rates_with_defaults() {
        let call = ToolCall::parse(
            "get_shipping_rates",
            json!({"to_city": "Austin", "to_state": "TX", "to_zip": "78701", "weight_oz": 8}),
        )
        .unwrap();
        match call {
            ToolCall::GetShippingRates(args) => {
                assert_eq!(args.weight_oz, 8.0);
                assert_eq!(args.length, 6.0);
                assert_eq!(args.width, 4.0);
                assert_eq!(args.height, 2.0);
                assert!(args.to_name.is_none());
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn parse_reports_missing_field() {
        let err = ToolCall::parse(
            "get_shipping_rates",
            json!({"to_city": "Austin", "to_state": "TX", "weight_oz": 8}),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: Missing required field 'to_zip' for tool 'get_shipping_rates'"
        );
    }

    #[test]
    fn parse_reports_unknown_tool() {
        let err = ToolCall::parse("teleport_package", json!({})).unwrap_err();
        assert_eq!(err, ToolParseError::UnknownTool("teleport_package".to_string()));
    }

    #[test]
    fn parse_reports_type_mismatch() {
        let err = ToolCall::parse("get_unfulfilled_orders", json!({"limit": "many"})).unwrap_err();
        match err {
            ToolParseError::Invalid { tool, .. } => assert_eq!(tool, "get_unfulfilled_orders"),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn bulk_ship_defaults_to_unconfirmed_preview() {
        let call = ToolCall::parse("bulk_ship_orders", json!({})).unwrap();
        match call {
            ToolCall::BulkShipOrders(args) => {
                assert!(!args.confirmed);
                assert!(!args.cheapest);
                assert!(args.order_ids.is_empty());
                assert!(args.filter.is_none());
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn bulk_filter_fields_parse() {
        let call = ToolCall::parse(
            "bulk_ship_orders",
            json!({
                "filter": {"max_weight_oz": 16, "destination_state": "CA"},
                "cheapest": true,
                "confirmed": true
            }),
        )
        .unwrap();
        match call {
            ToolCall::BulkShipOrders(args) => {
                let filter = args.filter.unwrap();
                assert_eq!(filter.max_weight_oz, Some(16.0));
                assert_eq!(filter.destination_state.as_deref(), Some("CA"));
                assert!(args.confirmed);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn tracking_accepts_either_identifier() {
        let call =
            ToolCall::parse("get_tracking_status", json!({"order_id": "ORD-1001"})).unwrap();
        match call {
            ToolCall::GetTrackingStatus(args) => {
                assert_eq!(args.order_id.as_deref(), Some("ORD-1001"));
                assert!(args.tracking_number.is_none());
            }
            other => panic!("wrong variant: {:?}", other),
        }
        // Both absent still parses; the executor reports the contract error.
        assert!(ToolCall::parse("get_tracking_status", json!({})).is_ok());
    }
}
