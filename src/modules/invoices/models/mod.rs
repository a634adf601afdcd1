mod invoice;

pub use invoice::{CreateInvoiceRequest, Invoice, InvoiceResponse, InvoiceStatus, PaymentModality};
