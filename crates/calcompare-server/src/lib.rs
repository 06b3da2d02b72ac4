//! # calcompare server
//!
//! Axum HTTP front end over the comparison engine.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod state;

pub use api::{create_router, start_server, ApiError};
pub use state::AppState;
