pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    BillingPeriod, MonthlyPayment, MonthlyPaymentId, MonthlyPaymentQuery, MonthlyPaymentUpdate,
    NewMonthlyPayment, TuitionStatus, UNNAMED_STUDENT,
};
pub use repository::MonthlyPaymentRepository;
pub use router::tuition_router;
pub use service::{TuitionService, TuitionServiceError};
