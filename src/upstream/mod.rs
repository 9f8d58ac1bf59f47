//! Upstream Module
//!
//! HTTP clients for the third-party news and sports APIs.

mod client;
mod news;
mod sports;

pub use client::{UpstreamClient, UpstreamResponse};
pub use news::NewsApi;
pub use sports::SportsFeed;
