// Payments (pagos) and their installment applications

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use controllers::configure;
pub use models::{AllocationMode, Payment, PaymentApplication, PaymentMethod};
pub use repositories::PaymentRepository;
pub use services::PaymentService;
