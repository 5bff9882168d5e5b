use super::domain::{Cpf, Enrollment, EnrollmentId};
use crate::academy::repository::RepositoryError;

/// Storage abstraction for enrollment rows, standing in for the hosted database table.
pub trait EnrollmentRepository: Send + Sync {
    /// Fails with [`RepositoryError::Conflict`] when the id or CPF is already stored.
    fn insert(&self, enrollment: Enrollment) -> Result<Enrollment, RepositoryError>;
    fn update(&self, enrollment: Enrollment) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, RepositoryError>;
    fn find_by_cpf(&self, cpf: &Cpf) -> Result<Option<Enrollment>, RepositoryError>;
    /// All rows, in no particular order.
    fn all(&self) -> Result<Vec<Enrollment>, RepositoryError>;
}
