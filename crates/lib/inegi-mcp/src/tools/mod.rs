//! MCP tool modules.
//!
//! Tools are grouped by upstream API: indicator catalog and time series on
//! one side, business-registry searches and counts on the other.

pub mod denue;
pub mod indicadores;
