use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::domain::{
    Discount, RedemptionClaim, RedemptionReceipt, Scholarship, ScholarshipError, ScholarshipId,
    ScholarshipState, ScholarshipStats, ScholarshipStatus,
};
use super::repository::ScholarshipRepository;
use crate::catalog::{CatalogStore, ProgramId};
use crate::events::{EventPublisher, LearningEvent};
use crate::storage::RepositoryError;

const MAX_BULK_QUANTITY: usize = 500;
const CODE_INSERT_RETRIES: usize = 5;

/// Facade over scholarship creation, redemption, revocation, and utilization stats.
pub struct ScholarshipRedemptionEngine<S, E> {
    catalog: Arc<CatalogStore>,
    repository: Arc<S>,
    events: Arc<E>,
}

impl<S, E> ScholarshipRedemptionEngine<S, E>
where
    S: ScholarshipRepository + 'static,
    E: EventPublisher + 'static,
{
    pub fn new(catalog: Arc<CatalogStore>, repository: Arc<S>, events: Arc<E>) -> Self {
        Self {
            catalog,
            repository,
            events,
        }
    }

    /// Consume a code exactly once and price the program for the redeeming student.
    pub fn redeem(
        &self,
        code: &str,
        claim: RedemptionClaim,
    ) -> Result<RedemptionReceipt, ScholarshipError> {
        let program = self.catalog.program(&claim.program_id).ok_or_else(|| {
            ScholarshipError::Validation(format!(
                "program '{}' is not in the catalog",
                claim.program_id.0
            ))
        })?;

        let consumed = self.repository.consume(code, &claim)?;

        let original_price_cents = program.price_cents;
        let discounted_price_cents = consumed.discount.apply(original_price_cents);
        let receipt = RedemptionReceipt {
            code: consumed.code.clone(),
            program_id: program.id.clone(),
            original_price_cents,
            discounted_price_cents,
            discount_cents: original_price_cents - discounted_price_cents,
            currency: program.currency.clone(),
        };

        tracing::info!(
            code = %receipt.code,
            program = %program.id.0,
            discounted = receipt.discounted_price_cents,
            "scholarship redeemed"
        );
        self.events.publish(
            LearningEvent::new("scholarship_redeemed", claim.student_id.clone())
                .detail("code", receipt.code.clone())
                .detail("program_id", program.id.0.clone())
                .detail(
                    "discounted_price_cents",
                    receipt.discounted_price_cents.to_string(),
                ),
        )?;

        Ok(receipt)
    }

    /// Create a single code, optionally bound to one student email.
    pub fn create(
        &self,
        program_id: ProgramId,
        discount: Discount,
        expires_at: Option<DateTime<Utc>>,
        bound_email: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Scholarship, ScholarshipError> {
        self.validate_discount(&discount)?;
        if self.catalog.program(&program_id).is_none() {
            return Err(ScholarshipError::Validation(format!(
                "program '{}' is not in the catalog",
                program_id.0
            )));
        }

        for _ in 0..CODE_INSERT_RETRIES {
            let scholarship = Scholarship {
                id: ScholarshipId(Uuid::new_v4().to_string()),
                program_id: program_id.clone(),
                code: generate_code(),
                discount,
                state: ScholarshipState::Active,
                bound_email: bound_email.clone(),
                expires_at,
                created_at: now,
            };
            match self.repository.insert(scholarship) {
                Ok(stored) => return Ok(stored),
                Err(RepositoryError::Conflict) => continue,
                Err(other) => return Err(other.into()),
            }
        }

        Err(ScholarshipError::Repository(RepositoryError::Conflict))
    }

    /// Create `quantity` codes sharing discount parameters, each with an
    /// independently unique code string.
    pub fn bulk_create(
        &self,
        program_id: ProgramId,
        quantity: usize,
        discount: Discount,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Scholarship>, ScholarshipError> {
        if quantity == 0 || quantity > MAX_BULK_QUANTITY {
            return Err(ScholarshipError::Validation(format!(
                "quantity must be between 1 and {MAX_BULK_QUANTITY}"
            )));
        }

        let mut created = Vec::with_capacity(quantity);
        for _ in 0..quantity {
            created.push(self.create(program_id.clone(), discount, expires_at, None, now)?);
        }
        Ok(created)
    }

    pub fn revoke(&self, code: &str) -> Result<Scholarship, ScholarshipError> {
        let revoked = self.repository.revoke(code)?;
        tracing::info!(code = %revoked.code, "scholarship revoked");
        Ok(revoked)
    }

    /// Utilization summary for a program's codes as observed at `now`.
    pub fn stats(
        &self,
        program_id: &ProgramId,
        now: DateTime<Utc>,
    ) -> Result<ScholarshipStats, ScholarshipError> {
        let program_price = self
            .catalog
            .program(program_id)
            .map(|program| program.price_cents)
            .unwrap_or(0);
        let codes = self.repository.by_program(program_id)?;

        let mut stats = ScholarshipStats {
            program_id: program_id.clone(),
            total: codes.len(),
            active: 0,
            used: 0,
            expired: 0,
            revoked: 0,
            utilization_rate: 0.0,
            total_discount_cents: 0,
        };

        for code in &codes {
            match code.status(now) {
                ScholarshipStatus::Active => stats.active += 1,
                ScholarshipStatus::Expired => stats.expired += 1,
                ScholarshipStatus::Revoked => stats.revoked += 1,
                ScholarshipStatus::Used => {
                    stats.used += 1;
                    stats.total_discount_cents +=
                        program_price - code.discount.apply(program_price);
                }
            }
        }

        if stats.total > 0 {
            stats.utilization_rate = stats.used as f64 / stats.total as f64;
        }

        Ok(stats)
    }

    fn validate_discount(&self, discount: &Discount) -> Result<(), ScholarshipError> {
        match discount {
            Discount::Percentage(percent) if !(*percent > 0.0 && *percent <= 100.0) => Err(
                ScholarshipError::Validation("percentage discount must be in (0, 100]".to_string()),
            ),
            Discount::Fixed(0) => Err(ScholarshipError::Validation(
                "fixed discount must be positive".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

fn generate_code() -> String {
    let entropy = Uuid::new_v4().simple().to_string();
    format!("SCH-{}", entropy[..12].to_ascii_uppercase())
}
