//! HTTP endpoint layer

pub mod handlers;
pub mod helpers;
pub mod router;
pub mod streaming;

// Re-export the router entry points for the binary and tests
pub use router::{AppState, create_router};
