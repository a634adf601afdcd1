pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use controllers::configure;
pub use models::{FinancingTerms, Installment, InstallmentStatus};
pub use repositories::InstallmentRepository;
pub use services::{AmortizationCalculator, InstallmentService};
