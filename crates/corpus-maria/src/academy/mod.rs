//! Dance academy domain: class schedule, enrollments, tuition, and back-office reporting.

pub mod classes;
pub mod enrollment;
pub mod finance;
pub mod memory;
pub mod money;
pub mod payment;
pub mod repository;
pub mod tuition;

pub use memory::{InMemoryEnrollmentRepository, InMemoryMonthlyPaymentRepository};
pub use money::Money;
pub use repository::RepositoryError;
