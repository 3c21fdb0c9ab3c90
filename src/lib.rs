// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod keys;
pub mod logging;
pub mod matcher;
pub mod queue;
pub mod runtime;
pub mod scheduler;
pub mod trainer;

pub use error::{Result, TrainerError};
pub use matcher::Outcome;
pub use trainer::{DisplayEntry, Trainer};
