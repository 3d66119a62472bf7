//! services/api/src/lib.rs
//!
//! The call desk service: adapters for the hosted database and the two
//! providers, configuration, and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
