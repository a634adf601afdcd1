pub mod conciliation_controller;

pub use conciliation_controller::configure;
