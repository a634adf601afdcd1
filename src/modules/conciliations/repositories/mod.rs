pub mod conciliation_repository;

pub use conciliation_repository::ConciliationRepository;
