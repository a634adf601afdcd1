mod conciliation;

pub use conciliation::{
    AcceptConciliationRequest, CloseConciliationRequest, Conciliation, ConciliationStatus,
    CreateConciliationRequest,
};
