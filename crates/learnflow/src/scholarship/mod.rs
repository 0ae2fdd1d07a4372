//! Scholarship redemption: single-use discount codes gating paid enrollment.
//! Consumption is exactly-once under concurrency; expiry is derived at read time.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Discount, RedemptionClaim, RedemptionReceipt, Scholarship, ScholarshipError, ScholarshipId,
    ScholarshipState, ScholarshipStats, ScholarshipStatus, ScholarshipView,
};
pub use repository::ScholarshipRepository;
pub use router::scholarship_router;
pub use service::ScholarshipRedemptionEngine;
