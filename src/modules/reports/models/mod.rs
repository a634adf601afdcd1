pub mod cartera_report;

pub use cartera_report::{
    aging_buckets, AgingBucket, CarteraSummary, CarteraTotals, OverdueItem, StatusCount,
};
