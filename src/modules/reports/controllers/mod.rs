mod report_controller;

pub use report_controller::{configure, get_cartera_report, CarteraReportQuery};
