pub mod history;
pub mod loop_;
pub mod parser;
pub mod prompt;
pub mod registry;

pub use history::{ConversationHistory, HistoryEntry};
pub use loop_::{AgentLoop, RunReport, TerminationReason};
pub use parser::{Action, ParsedStep, parse_text};
pub use prompt::PromptBuilder;
pub use registry::ToolRegistry;
