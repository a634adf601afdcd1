// Conciliations (pre-litigation hearings) and their acceptance cascade

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use controllers::configure;
pub use models::{Conciliation, ConciliationStatus};
pub use services::ConciliationService;
