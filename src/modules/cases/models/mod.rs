mod legal_case;

pub use legal_case::{CaseStatus, ChangeCaseStatusRequest, LegalCase};
