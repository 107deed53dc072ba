//! HTTP API layer for academy-rs.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: submission, analysis, payments and the admin console
//! - **Extractors**: bearer-token authentication
//! - **Middleware**: auth, logging, CORS
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
