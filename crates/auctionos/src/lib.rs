//! Client-side core of the tax-sale admin tool: asynchronous CSV import jobs and the
//! county region resolver that feeds the choropleth map.

pub mod api;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
