//! Database repositories.
//!
//! Narrow CRUD accessors over the transactional store. Everything above
//! this layer (pricing, lifecycle, payments, audit) talks to the database
//! exclusively through these types.

mod activity_log;
mod assignment;
mod payment;
mod pricing_rule;
mod user;

pub use activity_log::ActivityLogRepository;
pub use assignment::{AssignmentFilter, AssignmentRepository};
pub use payment::PaymentRepository;
pub use pricing_rule::PricingRuleRepository;
pub use user::UserRepository;
