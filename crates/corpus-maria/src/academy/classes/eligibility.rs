use super::{ClassSchedule, ClassSession, ClassSessionDescriptor};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::sync::Arc;

pub const NO_CLASS_AVAILABLE_MESSAGE: &str =
    "No momento não há turmas disponíveis para essa faixa etária. \
     Entre em contato com a academia para mais informações.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EligibilityError {
    #[error("birth date {birth_date} is after the reference date {reference_date}")]
    InvalidDateRange {
        birth_date: NaiveDate,
        reference_date: NaiveDate,
    },
    #[error("'{value}' is not a valid YYYY-MM-DD date")]
    InvalidBirthDate { value: String },
}

/// Whole years elapsed; a birthday falling on `reference_date` counts as reached.
pub fn compute_age(
    birth_date: NaiveDate,
    reference_date: NaiveDate,
) -> Result<u32, EligibilityError> {
    if birth_date > reference_date {
        return Err(EligibilityError::InvalidDateRange {
            birth_date,
            reference_date,
        });
    }

    let mut years = reference_date.year() - birth_date.year();
    if (reference_date.month(), reference_date.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }

    Ok(u32::try_from(years).unwrap_or_default())
}

pub fn parse_birth_date(raw: &str) -> Result<NaiveDate, EligibilityError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        EligibilityError::InvalidBirthDate {
            value: raw.to_string(),
        }
    })
}

/// Outcome of resolving a birth date against the schedule. An empty class list
/// is a normal result and carries the message families should see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub birth_date: NaiveDate,
    pub reference_date: NaiveDate,
    pub age: u32,
    pub classes: Vec<ClassSessionDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl Eligibility {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Maps a date of birth to the sessions a student may join.
#[derive(Debug, Clone, Default)]
pub struct ClassEligibilityResolver {
    schedule: Arc<ClassSchedule>,
}

impl ClassEligibilityResolver {
    pub fn new(schedule: ClassSchedule) -> Self {
        Self {
            schedule: Arc::new(schedule),
        }
    }

    pub fn schedule(&self) -> &ClassSchedule {
        &self.schedule
    }

    pub fn available_classes(&self, age: u32) -> Vec<&ClassSession> {
        self.schedule.available_for(age)
    }

    pub fn resolve_date(
        &self,
        birth_date: NaiveDate,
        reference_date: NaiveDate,
    ) -> Result<Eligibility, EligibilityError> {
        let age = compute_age(birth_date, reference_date)?;
        let classes: Vec<ClassSessionDescriptor> = self
            .available_classes(age)
            .into_iter()
            .map(ClassSession::descriptor)
            .collect();
        let message = classes.is_empty().then_some(NO_CLASS_AVAILABLE_MESSAGE);

        Ok(Eligibility {
            birth_date,
            reference_date,
            age,
            classes,
            message,
        })
    }

    pub fn resolve(
        &self,
        birth_date: &str,
        reference_date: NaiveDate,
    ) -> Result<Eligibility, EligibilityError> {
        self.resolve_date(parse_birth_date(birth_date)?, reference_date)
    }
}
