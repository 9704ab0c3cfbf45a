//! Core data types for Crewbill pricing

pub mod feature;
pub mod pricing;
pub mod tier;
