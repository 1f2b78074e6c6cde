//! Application layer: mention orchestration and chat use cases.

pub mod engine;
pub mod usecase;

pub use engine::{MentionEngine, MentionOutcome};
pub use usecase::ChatUsecase;
