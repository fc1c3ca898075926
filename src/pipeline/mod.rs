pub mod artifacts;
pub mod error;
pub mod orchestrator;
