pub mod conciliation_service;

pub use conciliation_service::{AcceptanceOutcome, ConciliationService};
