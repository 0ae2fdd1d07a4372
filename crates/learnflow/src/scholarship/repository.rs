use super::domain::{RedemptionClaim, Scholarship, ScholarshipError};
use crate::catalog::ProgramId;
use crate::storage::RepositoryError;

/// Storage abstraction for scholarship codes.
///
/// `consume` is the system's one true mutual-exclusion point: implementations must
/// look the code up, evaluate [`Scholarship::claim`], and store the consumed copy all
/// inside a single write-lock (or conditional-update) scope. Splitting the lookup
/// from the write would let two concurrent redemptions both succeed.
pub trait ScholarshipRepository: Send + Sync {
    fn insert(&self, scholarship: Scholarship) -> Result<Scholarship, RepositoryError>;
    fn fetch_by_code(&self, code: &str) -> Result<Option<Scholarship>, RepositoryError>;
    fn by_program(&self, program: &ProgramId) -> Result<Vec<Scholarship>, RepositoryError>;
    /// Atomically flip an active code to used. Returns the consumed record, or the
    /// typed reason the claim was rejected.
    fn consume(&self, code: &str, claim: &RedemptionClaim) -> Result<Scholarship, ScholarshipError>;
    /// Atomically flip an active code to revoked.
    fn revoke(&self, code: &str) -> Result<Scholarship, ScholarshipError>;
}
