//! Process-local stores used by the API binary and the test suites.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::enrollment::{Cpf, Enrollment, EnrollmentId, EnrollmentRepository};
use super::repository::RepositoryError;
use super::tuition::{BillingPeriod, MonthlyPayment, MonthlyPaymentId, MonthlyPaymentRepository};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryEnrollmentRepository {
    records: Arc<Mutex<HashMap<EnrollmentId, Enrollment>>>,
}

impl EnrollmentRepository for InMemoryEnrollmentRepository {
    fn insert(&self, enrollment: Enrollment) -> Result<Enrollment, RepositoryError> {
        let mut guard = lock(&self.records);
        let duplicate_cpf = guard
            .values()
            .any(|existing| existing.cpf == enrollment.cpf);
        if duplicate_cpf || guard.contains_key(&enrollment.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(enrollment.id, enrollment.clone());
        Ok(enrollment)
    }

    fn update(&self, enrollment: Enrollment) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records);
        match guard.get_mut(&enrollment.id) {
            Some(slot) => {
                *slot = enrollment;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, RepositoryError> {
        Ok(lock(&self.records).get(id).cloned())
    }

    fn find_by_cpf(&self, cpf: &Cpf) -> Result<Option<Enrollment>, RepositoryError> {
        Ok(lock(&self.records)
            .values()
            .find(|enrollment| &enrollment.cpf == cpf)
            .cloned())
    }

    fn all(&self) -> Result<Vec<Enrollment>, RepositoryError> {
        Ok(lock(&self.records).values().cloned().collect())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryMonthlyPaymentRepository {
    records: Arc<Mutex<HashMap<MonthlyPaymentId, MonthlyPayment>>>,
}

impl MonthlyPaymentRepository for InMemoryMonthlyPaymentRepository {
    fn insert(&self, payment: MonthlyPayment) -> Result<MonthlyPayment, RepositoryError> {
        let mut guard = lock(&self.records);
        let same_period = guard.values().any(|existing| {
            existing.enrollment_id == payment.enrollment_id
                && existing.period() == payment.period()
        });
        if same_period || guard.contains_key(&payment.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(payment.id, payment.clone());
        Ok(payment)
    }

    fn update(&self, payment: MonthlyPayment) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records);
        match guard.get_mut(&payment.id) {
            Some(slot) => {
                *slot = payment;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &MonthlyPaymentId) -> Result<Option<MonthlyPayment>, RepositoryError> {
        Ok(lock(&self.records).get(id).cloned())
    }

    fn find_for_period(
        &self,
        enrollment_id: &EnrollmentId,
        period: BillingPeriod,
    ) -> Result<Option<MonthlyPayment>, RepositoryError> {
        Ok(lock(&self.records)
            .values()
            .find(|payment| &payment.enrollment_id == enrollment_id && payment.period() == period)
            .cloned())
    }

    fn all(&self) -> Result<Vec<MonthlyPayment>, RepositoryError> {
        Ok(lock(&self.records).values().cloned().collect())
    }
}
