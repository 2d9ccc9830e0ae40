pub mod cli;
pub mod config;
pub mod exit_codes;
pub mod i18n;
pub mod llm;
pub mod logging;
pub mod outlet;
pub mod render;
pub mod supervisor;

// Re-export commonly used types
pub use config::Config;
pub use supervisor::state::{Stage, SupervisorState};
pub use supervisor::workflow::SupervisorWorkflow;
pub use supervisor::{RunOutcome, execute, launch};
