pub mod installment;

pub use installment::{
    FinancingTerms, Installment, InstallmentStatus, MAX_INSTALLMENTS, MIN_INSTALLMENTS,
};
