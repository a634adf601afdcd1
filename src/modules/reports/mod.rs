// Cartera reporting

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use controllers::configure;
pub use models::CarteraSummary;
pub use repositories::{MySqlReportRepository, ReportRepository};
pub use services::ReportService;
