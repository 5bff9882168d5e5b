//! Public enrollment intake and the back-office fee workflow.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    format_phone, Cpf, Enrollment, EnrollmentFilter, EnrollmentId, EnrollmentSubmission,
    EnrollmentView, PaymentStatus, PaymentUpdate,
};
pub use repository::EnrollmentRepository;
pub use router::enrollment_router;
pub use service::{EnrollmentService, EnrollmentServiceError, EnrollmentValidationError};
