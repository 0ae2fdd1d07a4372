use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ProgramId;
use crate::enrollment::StudentId;
use crate::events::EventError;
use crate::storage::RepositoryError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScholarshipId(pub String);

/// Discount applied to a program price at redemption time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "discount_type", content = "discount_value", rename_all = "snake_case")]
pub enum Discount {
    /// Percent off, 0 < value ≤ 100.
    Percentage(f64),
    /// Flat amount off in cents, floored at zero.
    Fixed(u64),
}

impl Discount {
    pub fn apply(&self, price_cents: u64) -> u64 {
        match self {
            Discount::Percentage(percent) => {
                let remaining = (price_cents as f64) * (1.0 - percent / 100.0);
                remaining.round().max(0.0) as u64
            }
            Discount::Fixed(amount) => price_cents.saturating_sub(*amount),
        }
    }
}

/// Stored state machine: active → used | revoked, one-way. Expiry is never stored;
/// it is derived at read time from `expires_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScholarshipState {
    Active,
    Used {
        used_by: StudentId,
        used_at: DateTime<Utc>,
    },
    Revoked,
}

/// Effective status as observed at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScholarshipStatus {
    Active,
    Used,
    Expired,
    Revoked,
}

impl ScholarshipStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ScholarshipStatus::Active => "active",
            ScholarshipStatus::Used => "used",
            ScholarshipStatus::Expired => "expired",
            ScholarshipStatus::Revoked => "revoked",
        }
    }
}

/// Single-use discount token bound to one program, optionally to one student email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scholarship {
    pub id: ScholarshipId,
    pub program_id: ProgramId,
    pub code: String,
    pub discount: Discount,
    pub state: ScholarshipState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bound_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Scholarship {
    /// Effective status at `now`. Expiry only applies to codes still active: a used
    /// code stays used even past its expiry date.
    pub fn status(&self, now: DateTime<Utc>) -> ScholarshipStatus {
        match &self.state {
            ScholarshipState::Used { .. } => ScholarshipStatus::Used,
            ScholarshipState::Revoked => ScholarshipStatus::Revoked,
            ScholarshipState::Active => match self.expires_at {
                Some(expires_at) if now > expires_at => ScholarshipStatus::Expired,
                _ => ScholarshipStatus::Active,
            },
        }
    }

    /// Validate a redemption against this code and produce the consumed copy.
    ///
    /// Repositories must evaluate this inside their write-lock scope so the
    /// active → used flip is one conditional update; two concurrent claims can then
    /// never both observe the active state.
    pub fn claim(&self, claim: &RedemptionClaim) -> Result<Scholarship, ScholarshipError> {
        match &self.state {
            ScholarshipState::Used { .. } => return Err(ScholarshipError::AlreadyUsed),
            ScholarshipState::Revoked => return Err(ScholarshipError::Revoked),
            ScholarshipState::Active => {}
        }

        if let Some(expires_at) = self.expires_at {
            if claim.now > expires_at {
                return Err(ScholarshipError::Expired { expired_at: expires_at });
            }
        }

        if self.program_id != claim.program_id {
            return Err(ScholarshipError::ProgramMismatch);
        }

        if let Some(bound) = &self.bound_email {
            let matches = claim
                .student_email
                .as_deref()
                .map(|email| email.eq_ignore_ascii_case(bound))
                .unwrap_or(false);
            if !matches {
                return Err(ScholarshipError::EmailMismatch);
            }
        }

        let mut used = self.clone();
        used.state = ScholarshipState::Used {
            used_by: claim.student_id.clone(),
            used_at: claim.now,
        };
        Ok(used)
    }

    pub fn status_view(&self, now: DateTime<Utc>) -> ScholarshipView {
        let (used_by, used_at) = match &self.state {
            ScholarshipState::Used { used_by, used_at } => {
                (Some(used_by.clone()), Some(used_at.to_rfc3339()))
            }
            _ => (None, None),
        };
        ScholarshipView {
            code: self.code.clone(),
            program_id: self.program_id.clone(),
            discount: self.discount,
            status: self.status(now).label(),
            bound_email: self.bound_email.clone(),
            expires_at: self.expires_at.map(|timestamp| timestamp.to_rfc3339()),
            used_by,
            used_at,
        }
    }
}

/// Who is redeeming, for what, and when. Identity fields come from the
/// authentication collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct RedemptionClaim {
    pub student_id: StudentId,
    pub student_email: Option<String>,
    pub program_id: ProgramId,
    pub now: DateTime<Utc>,
}

/// Priced outcome of a successful redemption, handed to the payment collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedemptionReceipt {
    pub code: String,
    pub program_id: ProgramId,
    pub original_price_cents: u64,
    pub discounted_price_cents: u64,
    pub discount_cents: u64,
    pub currency: String,
}

/// Sanitized representation of a code for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ScholarshipView {
    pub code: String,
    pub program_id: ProgramId,
    #[serde(flatten)]
    pub discount: Discount,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bound_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_by: Option<StudentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_at: Option<String>,
}

/// Per-program utilization summary for the read side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScholarshipStats {
    pub program_id: ProgramId,
    pub total: usize,
    pub active: usize,
    pub used: usize,
    pub expired: usize,
    pub revoked: usize,
    pub utilization_rate: f64,
    pub total_discount_cents: u64,
}

/// Typed rejection reasons for scholarship operations. Everything except
/// `Repository`/`Event` is an expected, recoverable outcome for the caller.
#[derive(Debug, thiserror::Error)]
pub enum ScholarshipError {
    #[error("scholarship code not found")]
    NotFound,
    #[error("scholarship code expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },
    #[error("scholarship code already used by another student")]
    AlreadyUsed,
    #[error("scholarship code has been revoked")]
    Revoked,
    #[error("scholarship code is bound to a different program")]
    ProgramMismatch,
    #[error("scholarship code is bound to a different student email")]
    EmailMismatch,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Event(#[from] EventError),
}

impl ScholarshipError {
    pub fn kind(&self) -> &'static str {
        match self {
            ScholarshipError::NotFound => "not_found",
            ScholarshipError::Expired { .. } => "expired",
            ScholarshipError::AlreadyUsed => "already_used",
            ScholarshipError::Revoked => "revoked",
            ScholarshipError::ProgramMismatch => "program_mismatch",
            ScholarshipError::EmailMismatch => "email_mismatch",
            ScholarshipError::Validation(_) => "validation_error",
            ScholarshipError::Repository(_) => "storage_failure",
            ScholarshipError::Event(_) => "event_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap()
    }

    fn code(discount: Discount) -> Scholarship {
        Scholarship {
            id: ScholarshipId("sch-1".to_string()),
            program_id: ProgramId("p1".to_string()),
            code: "SCH-TEST".to_string(),
            discount,
            state: ScholarshipState::Active,
            bound_email: None,
            expires_at: None,
            created_at: now(),
        }
    }

    fn claim() -> RedemptionClaim {
        RedemptionClaim {
            student_id: StudentId("s1".to_string()),
            student_email: Some("student@example.com".to_string()),
            program_id: ProgramId("p1".to_string()),
            now: now(),
        }
    }

    #[test]
    fn percentage_discount_reduces_price_proportionally() {
        // $200 at 30% off is $140.
        assert_eq!(Discount::Percentage(30.0).apply(20_000), 14_000);
    }

    #[test]
    fn fixed_discount_floors_at_zero() {
        // $200 minus $50 is $150.
        assert_eq!(Discount::Fixed(5_000).apply(20_000), 15_000);
        assert_eq!(Discount::Fixed(30_000).apply(20_000), 0);
    }

    #[test]
    fn claim_consumes_an_active_code() {
        let used = code(Discount::Percentage(30.0))
            .claim(&claim())
            .expect("claim succeeds");
        match used.state.clone() {
            ScholarshipState::Used { used_by, used_at } => {
                assert_eq!(used_by, StudentId("s1".to_string()));
                assert_eq!(used_at, now());
            }
            other => panic!("expected used state, got {other:?}"),
        }
        assert_eq!(used.status(now()), ScholarshipStatus::Used);
    }

    #[test]
    fn used_and_revoked_codes_reject_claims() {
        let mut used = code(Discount::Fixed(1_000));
        used.state = ScholarshipState::Used {
            used_by: StudentId("someone".to_string()),
            used_at: now(),
        };
        assert!(matches!(
            used.claim(&claim()),
            Err(ScholarshipError::AlreadyUsed)
        ));

        let mut revoked = code(Discount::Fixed(1_000));
        revoked.state = ScholarshipState::Revoked;
        assert!(matches!(
            revoked.claim(&claim()),
            Err(ScholarshipError::Revoked)
        ));
    }

    #[test]
    fn expiry_is_derived_at_read_time() {
        let mut expiring = code(Discount::Fixed(1_000));
        expiring.expires_at = Some(now() - chrono::Duration::days(1));

        // Stored state stays active; only the observed status changes.
        assert_eq!(expiring.status(now()), ScholarshipStatus::Expired);
        assert_eq!(expiring.state, ScholarshipState::Active);
        assert!(matches!(
            expiring.claim(&claim()),
            Err(ScholarshipError::Expired { .. })
        ));
    }

    #[test]
    fn scoping_violations_are_detected() {
        let mut foreign = code(Discount::Fixed(1_000));
        foreign.program_id = ProgramId("other".to_string());
        assert!(matches!(
            foreign.claim(&claim()),
            Err(ScholarshipError::ProgramMismatch)
        ));

        let mut bound = code(Discount::Fixed(1_000));
        bound.bound_email = Some("else@example.com".to_string());
        assert!(matches!(
            bound.claim(&claim()),
            Err(ScholarshipError::EmailMismatch)
        ));

        bound.bound_email = Some("STUDENT@example.com".to_string());
        assert!(bound.claim(&claim()).is_ok(), "email match ignores case");
    }
}
