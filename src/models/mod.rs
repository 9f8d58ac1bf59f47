//! Request, response and record models for the gateway
//!
//! `requests` holds the per-route body types and their resolved queries,
//! `responses` the outgoing DTOs, and `records` the rows of the sports
//! mirror tables.

pub mod records;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use records::{EventStatus, League, SportEvent, StreamingOption, StreamingProvider};
pub use responses::{HealthResponse, Source, StatsResponse, UnknownEndpointResponse};
