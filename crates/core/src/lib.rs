//! Core business logic for academy-rs.
//!
//! The services in this crate implement the marketplace flow: pricing and
//! scope decisions, the assignment lifecycle state machine, payment
//! orchestration against an external provider, the append-only activity
//! log, and the admin aggregates. All persistence goes through the
//! repositories in `academy-db`.

pub mod services;

pub use services::*;
