//! Tools module - the model-facing tool surface
//!
//! Three layers: `schema` defines what the model is told it can call,
//! `call` parses what it actually sent into a closed `ToolCall` enum,
//! and `executor` runs the call against the shipping backend and order
//! book. Only `ToolExecutor::execute` crosses from model intent to side
//! effects, and it always returns a rendered string.

mod call;
mod executor;
mod schema;

pub use call::{
    BulkFilter, BulkShipArgs, CreateShipmentArgs, GetRatesArgs, GetTrackingArgs, ListOrdersArgs,
    ToolCall, ToolParseError, ValidateAddressArgs,
};
pub use executor::{infer_carrier, ToolExecutor};
pub use schema::tool_schemas;
