//! Crewbill quote service
//!
//! Serves quotes, selection transitions and upgrade options from a
//! [`crewbill_engine::PricingEngine`] over HTTP/JSON.

pub mod api;
pub mod config;
pub mod metrics;

pub use api::{router, AppState};
pub use config::ServerConfig;
