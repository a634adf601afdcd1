// Invoices module

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use controllers::configure;
pub use models::{Invoice, InvoiceStatus, PaymentModality};
pub use repositories::InvoiceRepository;
pub use services::InvoiceService;
