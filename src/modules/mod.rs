pub mod cases;
pub mod conciliations;
pub mod health;
pub mod installments;
pub mod invoices;
pub mod payments;
pub mod reports;
