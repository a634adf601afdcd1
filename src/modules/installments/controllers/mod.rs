pub mod installment_controller;

pub use installment_controller::{configure, get_installments, quote_amortization};
