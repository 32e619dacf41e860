use serde_json::{Map, Value};

/// Observable progress of a run, emitted in order for a presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    Thought {
        step: usize,
        text: String,
    },
    Action {
        step: usize,
        name: String,
        arguments: Map<String, Value>,
    },
    Observation {
        step: usize,
        text: String,
    },
    Final {
        step: usize,
        answer: String,
    },
}

impl StepEvent {
    pub fn step(&self) -> usize {
        match self {
            Self::Thought { step, .. }
            | Self::Action { step, .. }
            | Self::Observation { step, .. }
            | Self::Final { step, .. } => *step,
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &StepEvent);
}

/// Discards every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &StepEvent) {}
}
