//! Library exports for scigateway, shared between the binary and tests.

pub mod analytics;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
