use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tracing::{debug, info};

use super::domain::{
    BillingPeriod, MonthlyPayment, MonthlyPaymentId, MonthlyPaymentQuery, MonthlyPaymentUpdate,
    NewMonthlyPayment, TuitionStatus, UNNAMED_STUDENT,
};
use super::repository::MonthlyPaymentRepository;
use crate::academy::enrollment::{EnrollmentId, EnrollmentRepository};
use crate::academy::money::Money;
use crate::academy::repository::RepositoryError;

/// Error raised by the tuition service.
#[derive(Debug, thiserror::Error)]
pub enum TuitionServiceError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("month must be between 1 and 12 (got {0})")]
    InvalidMonth(u32),
    #[error("enrollment {0} does not exist")]
    UnknownEnrollment(EnrollmentId),
    #[error("enrollment {enrollment_id} already has a charge for {period}")]
    AlreadyBilled {
        enrollment_id: EnrollmentId,
        period: BillingPeriod,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Monthly tuition bookkeeping over the enrollment and payment stores.
pub struct TuitionService<E, P> {
    enrollments: Arc<E>,
    payments: Arc<P>,
    default_amount: Money,
}

impl<E, P> TuitionService<E, P>
where
    E: EnrollmentRepository + 'static,
    P: MonthlyPaymentRepository + 'static,
{
    pub fn new(enrollments: Arc<E>, payments: Arc<P>, default_amount: Money) -> Self {
        Self {
            enrollments,
            payments,
            default_amount,
        }
    }

    pub fn default_amount(&self) -> Money {
        self.default_amount
    }

    /// Create a pending charge; amount falls back to the configured tuition.
    pub fn create(
        &self,
        request: NewMonthlyPayment,
        now: DateTime<Utc>,
    ) -> Result<MonthlyPayment, TuitionServiceError> {
        let student_name = request
            .student_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        let (enrollment_id, student_name, month, year) =
            match (request.enrollment_id, student_name, request.month, request.year) {
                (Some(id), Some(name), Some(month), Some(year)) => (id, name, month, year),
                (id, name, month, year) => {
                    let mut missing = Vec::new();
                    if id.is_none() {
                        missing.push("enrollment_id");
                    }
                    if name.is_none() {
                        missing.push("student_name");
                    }
                    if month.is_none() {
                        missing.push("month");
                    }
                    if year.is_none() {
                        missing.push("year");
                    }
                    return Err(TuitionServiceError::MissingFields(missing));
                }
            };

        let period =
            BillingPeriod::new(month, year).ok_or(TuitionServiceError::InvalidMonth(month))?;
        if self.enrollments.fetch(&enrollment_id)?.is_none() {
            return Err(TuitionServiceError::UnknownEnrollment(enrollment_id));
        }

        let payment = self.insert_charge(
            enrollment_id,
            student_name.to_string(),
            period,
            request.amount.unwrap_or(self.default_amount),
            now,
        )?;
        info!(
            payment_id = %payment.id,
            enrollment_id = %payment.enrollment_id,
            period = %period,
            "monthly payment created"
        );
        Ok(payment)
    }

    /// Charges matching `query`, newest period first, then by student name.
    pub fn list(
        &self,
        query: &MonthlyPaymentQuery,
    ) -> Result<Vec<MonthlyPayment>, TuitionServiceError> {
        let mut payments: Vec<MonthlyPayment> = self
            .payments
            .all()?
            .into_iter()
            .filter(|payment| query.matches(payment))
            .collect();
        payments.sort_by(|a, b| {
            b.year
                .cmp(&a.year)
                .then(b.month.cmp(&a.month))
                .then_with(|| a.student_name.cmp(&b.student_name))
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        Ok(payments)
    }

    pub fn get(&self, id: &MonthlyPaymentId) -> Result<MonthlyPayment, TuitionServiceError> {
        let payment = self.payments.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(payment)
    }

    /// Apply an administrator's edit. Marking a charge paid without a date
    /// stamps the academy's local date at `now`.
    pub fn update(
        &self,
        id: &MonthlyPaymentId,
        update: MonthlyPaymentUpdate,
        now: DateTime<Utc>,
    ) -> Result<MonthlyPayment, TuitionServiceError> {
        let mut payment = self.get(id)?;

        if let Some(status) = update.status {
            payment.status = status;
        }
        if let Some(amount) = update.amount {
            payment.amount = amount;
        }
        if update.payment_method.is_some() {
            payment.payment_method = update.payment_method;
        }
        if update.payment_notes.is_some() {
            payment.payment_notes = update.payment_notes;
        }
        payment.payment_date = match (update.payment_date, payment.status) {
            (Some(date), _) => Some(date),
            (None, TuitionStatus::Paid) => payment
                .payment_date
                .or_else(|| Some(now.with_timezone(&Local).date_naive())),
            (None, TuitionStatus::Pending) => payment.payment_date,
        };

        self.payments.update(payment.clone())?;
        info!(
            payment_id = %payment.id,
            status = payment.status.label(),
            "monthly payment updated"
        );
        Ok(payment)
    }

    /// Create a pending charge for `period` for every enrollment lacking one.
    pub fn generate_missing(
        &self,
        period: BillingPeriod,
        now: DateTime<Utc>,
    ) -> Result<Vec<MonthlyPayment>, TuitionServiceError> {
        let billed: HashSet<EnrollmentId> = self
            .list(&MonthlyPaymentQuery::for_period(period))?
            .into_iter()
            .map(|payment| payment.enrollment_id)
            .collect();

        let mut enrollments = self.enrollments.all()?;
        enrollments.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });

        let mut created = Vec::new();
        for enrollment in enrollments {
            if billed.contains(&enrollment.id) {
                continue;
            }
            let student_name = match enrollment.full_name.trim() {
                "" => UNNAMED_STUDENT.to_string(),
                name => name.to_string(),
            };
            debug!(enrollment_id = %enrollment.id, period = %period, "generating monthly payment");
            created.push(self.insert_charge(
                enrollment.id,
                student_name,
                period,
                self.default_amount,
                now,
            )?);
        }

        info!(period = %period, created = created.len(), "monthly payments generated");
        Ok(created)
    }

    fn insert_charge(
        &self,
        enrollment_id: EnrollmentId,
        student_name: String,
        period: BillingPeriod,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<MonthlyPayment, TuitionServiceError> {
        if self
            .payments
            .find_for_period(&enrollment_id, period)?
            .is_some()
        {
            return Err(TuitionServiceError::AlreadyBilled {
                enrollment_id,
                period,
            });
        }

        let payment = MonthlyPayment {
            id: MonthlyPaymentId::generate(),
            enrollment_id,
            student_name,
            month: period.month,
            year: period.year,
            amount,
            status: TuitionStatus::Pending,
            payment_date: None,
            payment_method: None,
            payment_notes: None,
            created_at: now,
        };

        self.payments.insert(payment).map_err(|err| match err {
            RepositoryError::Conflict => TuitionServiceError::AlreadyBilled {
                enrollment_id,
                period,
            },
            other => other.into(),
        })
    }
}
