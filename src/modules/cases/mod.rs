// Legal cases (procesos)

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use controllers::configure;
pub use models::{CaseStatus, LegalCase};
pub use repositories::CaseRepository;
pub use services::CaseService;
