//! gradebook-core: Evaluation model, grading policy, and repository.
//!
//! This crate defines the evaluation entities and their grading rules, the
//! persistence gateway traits, and the repository that keeps the in-memory
//! set and the durable store in step.

pub mod error;
pub mod exchange;
pub mod gateway;
pub mod grading;
pub mod memory;
pub mod model;
pub mod repository;
pub mod statistics;

pub use error::{RecordError, RepositoryError, StoreError, ValidationError};
pub use exchange::EvaluationRecord;
pub use gateway::{GatewayConnection, PersistenceGateway, RecordId, StoredRow};
pub use memory::InMemoryGateway;
pub use model::{Evaluation, EvaluationDetails, EvaluationKind, KindFilter};
pub use repository::{EvaluationRepository, ImportMode, ImportReport, LoadReport, Removal};
pub use statistics::{KindStats, Summary};
