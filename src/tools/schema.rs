//! JSON schemas for the six tools, as sent to the model

use serde_json::{json, Value};

/// Tool definitions in the Messages-API shape: name, description, and a
/// JSON-schema input contract.
pub fn tool_schemas() -> Vec<Value> {
    vec![
        json!({
            "name": "get_shipping_rates",
            "description": "Get shipping rates from multiple carriers for a package. Returns rates sorted by price with carrier, service, cost, and estimated delivery days.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "to_name": {"type": "string", "description": "Recipient name"},
                    "to_street": {"type": "string", "description": "Street address (e.g., '123 Main St')"},
                    "to_city": {"type": "string", "description": "City name"},
                    "to_state": {"type": "string", "description": "Two-letter state code (e.g., 'CA', 'NY')"},
                    "to_zip": {"type": "string", "description": "ZIP code"},
                    "weight_oz": {"type": "number", "description": "Package weight in ounces"},
                    "length": {"type": "number", "description": "Package length in inches", "default": 6},
                    "width": {"type": "number", "description": "Package width in inches", "default": 4},
                    "height": {"type": "number", "description": "Package height in inches", "default": 2}
                },
                "required": ["to_city", "to_state", "to_zip", "weight_oz"]
            }
        }),
        json!({
            "name": "validate_address",
            "description": "Validate a shipping address and get the corrected/standardized version. Use this before shipping to avoid delivery issues.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Recipient name"},
                    "street": {"type": "string", "description": "Street address"},
                    "city": {"type": "string", "description": "City"},
                    "state": {"type": "string", "description": "Two-letter state code"},
                    "zip": {"type": "string", "description": "ZIP code"}
                },
                "required": ["street", "city", "state", "zip"]
            }
        }),
        json!({
            "name": "create_shipment",
            "description": "Create a shipment and purchase a label. Returns tracking number and label URL. Only call this after getting rates and confirming with the user.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "to_name": {"type": "string", "description": "Recipient name"},
                    "to_street": {"type": "string", "description": "Street address"},
                    "to_city": {"type": "string", "description": "City"},
                    "to_state": {"type": "string", "description": "Two-letter state code"},
                    "to_zip": {"type": "string", "description": "ZIP code"},
                    "weight_oz": {"type": "number", "description": "Package weight in ounces"},
                    "length": {"type": "number", "description": "Package length in inches", "default": 6},
                    "width": {"type": "number", "description": "Package width in inches", "default": 4},
                    "height": {"type": "number", "description": "Package height in inches", "default": 2},
                    "rate_id": {"type": "string", "description": "The rate ID from get_shipping_rates to use"},
                    "order_id": {"type": "string", "description": "Link the shipment to this order and mark it shipped"}
                },
                "required": ["to_name", "to_street", "to_city", "to_state", "to_zip", "weight_oz", "rate_id"]
            }
        }),
        json!({
            "name": "get_tracking_status",
            "description": "Get the current tracking status and history for a shipment. Use tracking_number or order_id.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "tracking_number": {"type": "string", "description": "The tracking number to look up"},
                    "order_id": {"type": "string", "description": "Get tracking for this order's shipment"}
                },
                "required": []
            }
        }),
        json!({
            "name": "get_unfulfilled_orders",
            "description": "Get list of orders that need to be shipped. Returns order number, recipient name, destination city/state, item count, and total weight.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "limit": {"type": "integer", "description": "Maximum number of orders to return", "default": 20},
                    "search": {"type": "string", "description": "Search by order number, customer name, or destination"}
                },
                "required": []
            }
        }),
        json!({
            "name": "bulk_ship_orders",
            "description": "Ship multiple orders at once. Returns summary with count, total cost, and tracking numbers. IMPORTANT: Always summarize what will happen and get user confirmation before calling this tool.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "order_ids": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of order IDs to ship"
                    },
                    "filter": {
                        "type": "object",
                        "description": "Filter orders instead of specifying IDs",
                        "properties": {
                            "max_weight_oz": {"type": "number", "description": "Only ship orders at or under this weight (in ounces)"},
                            "destination_state": {"type": "string", "description": "Only ship orders going to this state"},
                            "created_after": {"type": "string", "description": "Only ship orders created after this date (YYYY-MM-DD)"}
                        }
                    },
                    "carrier": {"type": "string", "description": "Carrier to use for all shipments (e.g., 'USPS', 'UPS', 'FedEx')"},
                    "service": {"type": "string", "description": "Service level to use (e.g., 'Ground', 'Priority')"},
                    "cheapest": {"type": "boolean", "description": "Use cheapest available option for each order", "default": false},
                    "confirmed": {"type": "boolean", "description": "Set to true to confirm execution. If false or missing, returns preview only.", "default": false}
                },
                "required": []
            }
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_tools_with_fixed_names() {
        let schemas = tool_schemas();
        let names: Vec<&str> = schemas
            .iter()
            .filter_map(|s| s["name"].as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "get_shipping_rates",
                "validate_address",
                "create_shipment",
                "get_tracking_status",
                "get_unfulfilled_orders",
                "bulk_ship_orders",
            ]
        );
    }

    #[test]
    fn every_schema_has_input_contract() {
        for schema in tool_schemas() {
            assert!(schema["description"].is_string());
            assert_eq!(schema["input_schema"]["type"], "object");
            assert!(schema["input_schema"]["required"].is_array());
        }
    }

    #[test]
    fn parcel_dimension_defaults() {
        let schemas = tool_schemas();
        let rates = &schemas[0]["input_schema"]["properties"];
        assert_eq!(rates["length"]["default"], 6);
        assert_eq!(rates["width"]["default"], 4);
        assert_eq!(rates["height"]["default"], 2);
    }
}
