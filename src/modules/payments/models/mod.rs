mod payment;

pub use payment::{
    AllocationMode, ManualAllocation, Payment, PaymentApplication, PaymentMethod,
    RegisterPaymentRequest,
};
