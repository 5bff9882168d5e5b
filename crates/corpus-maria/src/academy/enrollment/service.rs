use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tracing::{info, warn};

use super::domain::{
    digits_only, Cpf, Enrollment, EnrollmentFilter, EnrollmentId, EnrollmentSubmission,
    PaymentStatus, PaymentUpdate,
};
use super::repository::EnrollmentRepository;
use crate::academy::classes::{
    ClassEligibilityResolver, EligibilityError, NO_CLASS_AVAILABLE_MESSAGE,
};
use crate::academy::repository::RepositoryError;

/// Reasons a form submission is turned away before anything is stored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrollmentValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("CPF deve ter 11 dígitos")]
    InvalidCpf,
    #[error(transparent)]
    Eligibility(#[from] EligibilityError),
    #[error("{}", NO_CLASS_AVAILABLE_MESSAGE)]
    NoClassAvailable { age: u32 },
    #[error("Por favor, selecione uma turma")]
    ClassNotSelected,
    #[error("'{selected}' is not open to students aged {age}")]
    ClassNotEligible { selected: String, age: u32 },
    #[error("Este CPF já está cadastrado em nosso sistema")]
    DuplicateCpf,
}

/// Error raised by the enrollment service.
#[derive(Debug, thiserror::Error)]
pub enum EnrollmentServiceError {
    #[error(transparent)]
    Validation(#[from] EnrollmentValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Service composing form validation, class eligibility, and the enrollment store.
pub struct EnrollmentService<R> {
    repository: Arc<R>,
    resolver: ClassEligibilityResolver,
}

impl<R> EnrollmentService<R>
where
    R: EnrollmentRepository + 'static,
{
    pub fn new(repository: Arc<R>, resolver: ClassEligibilityResolver) -> Self {
        Self {
            repository,
            resolver,
        }
    }

    pub fn resolver(&self) -> &ClassEligibilityResolver {
        &self.resolver
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Validate and store a new enrollment awaiting its fee payment.
    ///
    /// Age is computed against the academy's local calendar date at `now`.
    pub fn submit(
        &self,
        submission: EnrollmentSubmission,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, EnrollmentServiceError> {
        let full_name = required("full_name", &submission.full_name)?;
        let address = required("address", &submission.address)?;
        let phone = digits_only(&submission.phone);
        if phone.is_empty() {
            return Err(EnrollmentValidationError::MissingField { field: "phone" }.into());
        }
        if submission.cpf.trim().is_empty() {
            return Err(EnrollmentValidationError::MissingField { field: "cpf" }.into());
        }
        let cpf = Cpf::parse(&submission.cpf).ok_or(EnrollmentValidationError::InvalidCpf)?;
        required("date_of_birth", &submission.date_of_birth)?;

        let today = now.with_timezone(&Local).date_naive();
        let eligibility = self
            .resolver
            .resolve(&submission.date_of_birth, today)
            .map_err(EnrollmentValidationError::from)?;

        if eligibility.is_empty() {
            return Err(EnrollmentValidationError::NoClassAvailable {
                age: eligibility.age,
            }
            .into());
        }

        let requested = submission
            .selected_class
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty());
        let selected_class = match requested {
            Some(label) => eligibility
                .classes
                .iter()
                .find(|class| class.label == label)
                .map(|class| class.label.clone())
                .ok_or_else(|| EnrollmentValidationError::ClassNotEligible {
                    selected: label.to_string(),
                    age: eligibility.age,
                })?,
            None if eligibility.classes.len() == 1 => eligibility.classes[0].label.clone(),
            None => return Err(EnrollmentValidationError::ClassNotSelected.into()),
        };

        if self.repository.find_by_cpf(&cpf)?.is_some() {
            warn!("enrollment refused: CPF already registered");
            return Err(EnrollmentValidationError::DuplicateCpf.into());
        }

        let enrollment = Enrollment {
            id: EnrollmentId::generate(),
            full_name,
            address,
            phone,
            cpf,
            date_of_birth: eligibility.birth_date,
            age: eligibility.age,
            selected_class,
            shift: submission
                .shift
                .map(|shift| shift.trim().to_string())
                .filter(|shift| !shift.is_empty()),
            payment_status: PaymentStatus::AwaitingPayment,
            payment_amount: None,
            payment_method: None,
            payment_date: None,
            notes: None,
            created_at: now,
        };

        let stored = self.repository.insert(enrollment).map_err(|err| match err {
            RepositoryError::Conflict => {
                EnrollmentServiceError::Validation(EnrollmentValidationError::DuplicateCpf)
            }
            other => other.into(),
        })?;

        info!(
            enrollment_id = %stored.id,
            age = stored.age,
            class = %stored.selected_class,
            "enrollment registered"
        );
        Ok(stored)
    }

    /// Enrollments matching `filter`, newest first.
    pub fn list(&self, filter: EnrollmentFilter) -> Result<Vec<Enrollment>, EnrollmentServiceError> {
        let mut enrollments: Vec<Enrollment> = self
            .repository
            .all()?
            .into_iter()
            .filter(|enrollment| filter.matches(enrollment.payment_status))
            .collect();
        enrollments.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        Ok(enrollments)
    }

    pub fn get(&self, id: &EnrollmentId) -> Result<Enrollment, EnrollmentServiceError> {
        let enrollment = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(enrollment)
    }

    /// Record a fee payment change. Without an explicit date the change is stamped `now`.
    pub fn update_payment(
        &self,
        id: &EnrollmentId,
        update: PaymentUpdate,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, EnrollmentServiceError> {
        let mut enrollment = self.get(id)?;

        enrollment.payment_status = update.payment_status;
        if update.payment_amount.is_some() {
            enrollment.payment_amount = update.payment_amount;
        }
        if update.payment_method.is_some() {
            enrollment.payment_method = update.payment_method;
        }
        if update.notes.is_some() {
            enrollment.notes = update.notes;
        }
        enrollment.payment_date = Some(update.payment_date.unwrap_or(now));

        self.repository.update(enrollment.clone())?;
        info!(
            enrollment_id = %enrollment.id,
            status = enrollment.payment_status.label(),
            "enrollment payment updated"
        );
        Ok(enrollment)
    }
}

fn required(field: &'static str, value: &str) -> Result<String, EnrollmentValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(EnrollmentValidationError::MissingField { field })
    } else {
        Ok(trimmed.to_string())
    }
}
