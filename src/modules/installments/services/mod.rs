pub mod amortization;
pub mod installment_service;

pub use amortization::{AmortizationCalculator, AmortizationRow, AmortizationSchedule};
pub use installment_service::InstallmentService;
