//! Database entities.

#![allow(missing_docs)]

pub mod activity_log;
pub mod assignment;
pub mod payment;
pub mod pricing_rule;
pub mod user;

pub use activity_log::Entity as ActivityLog;
pub use assignment::Entity as Assignment;
pub use payment::Entity as Payment;
pub use pricing_rule::Entity as PricingRule;
pub use user::Entity as User;
