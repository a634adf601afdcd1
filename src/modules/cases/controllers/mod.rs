pub mod case_controller;

pub use case_controller::configure;
