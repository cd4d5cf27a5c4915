//! REST API serving the aggregated governor views
//!
//! Every request fetches a fresh snapshot through [`GovernorService`] and
//! wraps successful results in a `{"data": ...}` envelope.
//!
//! [`GovernorService`]: crate::service::GovernorService

mod dto;
mod handlers;
mod server;

pub use dto::{DataResponse, EnqueuedStatusResponse, ErrorResponse, HealthResponse};
pub use server::{router, run_server};
