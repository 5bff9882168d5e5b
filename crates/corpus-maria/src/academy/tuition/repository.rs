use super::domain::{BillingPeriod, MonthlyPayment, MonthlyPaymentId};
use crate::academy::enrollment::EnrollmentId;
use crate::academy::repository::RepositoryError;

/// Storage abstraction for monthly tuition charges.
pub trait MonthlyPaymentRepository: Send + Sync {
    /// Fails with [`RepositoryError::Conflict`] when the id or the
    /// enrollment/period pair is already stored.
    fn insert(&self, payment: MonthlyPayment) -> Result<MonthlyPayment, RepositoryError>;
    fn update(&self, payment: MonthlyPayment) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &MonthlyPaymentId) -> Result<Option<MonthlyPayment>, RepositoryError>;
    fn find_for_period(
        &self,
        enrollment_id: &EnrollmentId,
        period: BillingPeriod,
    ) -> Result<Option<MonthlyPayment>, RepositoryError>;
    fn all(&self) -> Result<Vec<MonthlyPayment>, RepositoryError>;
}
