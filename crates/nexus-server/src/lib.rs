//! Nexus gateway: HTTP endpoints for the demo's AI capabilities.
//!
//! Every endpoint is a thin relay: validate the request, call the provider
//! boundary, and return (or stream) the result. The streaming endpoints
//! speak the UI Message Stream protocol over SSE.

pub mod api;
pub mod error;
pub mod state;
pub mod tools;
pub mod transport;

mod schemas;

pub use error::ApiError;
pub use state::AppState;
