pub mod provider;
pub mod sink;
pub mod tool;

pub use provider::{ChatMessage, ChatRequest, ChatResponse, Provider, ToolCall};
pub use sink::{EventSink, NullSink, StepEvent};
pub use tool::{Tool, ToolSpec};
