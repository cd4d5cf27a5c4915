//! Wormscan governor: guardian quorum aggregation for governor telemetry
//!
//! Each Wormhole guardian publishes the governor limits it enforces and the
//! capacity it has left per chain. This crate collects those reports from
//! one or more stores and reduces them to the values a quorum of guardians
//! agrees on, the most restrictive single report per chain, and the set of
//! messages currently held back by the governor.

pub mod config;
pub mod error;
pub mod governor;
pub mod service;
pub mod source;
pub mod telemetry;

#[cfg(feature = "metrics")]
pub mod metrics;

#[cfg(feature = "rest-api")]
pub mod rest_api;

pub use crate::error::{Error, Result};
