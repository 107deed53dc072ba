//! Business logic services.

#![allow(missing_docs)]

pub mod activity_log;
pub mod assignment;
pub mod lifecycle;
pub mod payment;
pub mod pricing;
pub mod stats;
pub mod user;

pub use activity_log::{ActivityLogService, ActivityType, NewActivity};
pub use assignment::{AssignmentService, FileRef, SubmitAssignmentInput};
pub use lifecycle::{
    AdminSetStatusInput, AssignmentStatus, LifecycleEvent, LifecycleService, transition,
};
pub use payment::{
    Checkout, CheckoutRequest, CheckoutStatus, InitiatedPayment, NoopProvider, PaymentProvider,
    PaymentQuote, PaymentService, PaymentStatus, VerifyResult, VerifyStatus, WiseProvider,
};
pub use pricing::{
    Complexity, PricingDecision, PricingEngine, PricingInput, PricingService, Urgency,
};
pub use stats::{DashboardStats, StatsService};
pub use user::{RegisterUserInput, UpdateProfileInput, UserRole, UserService};
