// Library root: exposes the pipeline and channels to integration tests.
// The binary entry point is src/main.rs.

pub mod comms;
pub mod config;
pub mod error;
pub mod llm;
pub mod logger;
pub mod pipeline;
pub mod prompt;
