//! Candidate service with duplicate-safe single and bulk ingestion

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod services;
pub mod state;

pub use error::{Error, Result};
