pub mod agent;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod providers;
pub mod tools;
pub mod traits;

pub use agent::{AgentLoop, RunReport, TerminationReason, ToolRegistry};
pub use config::*;
pub use db::Database;
pub use error::{RegistryError, SetupError};
pub use format::{Cell, Observation, format_observation};
pub use providers::*;
pub use tools::*;
pub use traits::*;
