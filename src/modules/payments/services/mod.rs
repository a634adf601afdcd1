pub mod payment_allocator;
pub mod payment_service;

pub use payment_allocator::{
    allocate_automatic, allocate_cash, allocate_manual, Allocation, AllocationPlan,
    OutstandingInstallment,
};
pub use payment_service::{plan_payment, PaymentPreview, PaymentReceipt, PaymentService};
