//! Turns a model reply into a [`ParsedStep`].
//!
//! Two encodings feed the same type: a provider-native structured call, and
//! free text following the `THOUGHT:` / `ACTION:` / `FINAL ANSWER:` grammar.
//! Both are pure functions; nothing here ever fails. Unrecognized input
//! simply yields absent fields.

use crate::traits::{ChatResponse, ToolCall};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static THOUGHT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)THOUGHT:(.*?)(?:ACTION:|FINAL ANSWER:|\z)").unwrap());
static ACTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ACTION:\s*(\w+)\s*\{").unwrap());
static FINAL_ANSWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)FINAL ANSWER:(.*)").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl Action {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// `name{json}`, the form the grammar uses.
    pub fn render(&self) -> String {
        format!("{}{}", self.name, Value::Object(self.arguments.clone()))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedStep {
    pub thought: Option<String>,
    pub action: Option<Action>,
    pub final_answer: Option<String>,
}

impl ParsedStep {
    /// Picks the channel: the first structured call wins, otherwise the text
    /// is parsed with the grammar.
    pub fn from_response(response: &ChatResponse) -> Self {
        match response.tool_calls.first() {
            Some(call) => Self::from_tool_call(call),
            None => parse_text(response.text_or_empty()),
        }
    }

    /// A structured call carries only the action; its arguments are taken
    /// verbatim.
    pub fn from_tool_call(call: &ToolCall) -> Self {
        Self {
            thought: None,
            action: Some(Action::new(call.name.clone(), parse_arguments(&call.arguments))),
            final_answer: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.thought.is_none() && self.action.is_none() && self.final_answer.is_none()
    }
}

pub fn parse_text(text: &str) -> ParsedStep {
    let thought = THOUGHT
        .captures(text)
        .and_then(|caps| non_empty(caps.get(1)?.as_str()));

    let action = ACTION.captures(text).and_then(|caps| {
        let name = caps.get(1)?.as_str().to_string();
        let open = caps.get(0)?.end() - 1;
        let object = balanced_object(&text[open..]);
        Some(Action::new(name, parse_arguments(object)))
    });

    let final_answer = FINAL_ANSWER
        .captures(text)
        .and_then(|caps| non_empty(caps.get(1)?.as_str()));

    ParsedStep {
        thought,
        action,
        final_answer,
    }
}

/// Malformed or non-object JSON degrades to an empty argument mapping so the
/// model gets another turn to correct itself.
pub fn parse_arguments(raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn non_empty(segment: &str) -> Option<String> {
    let trimmed = segment.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Slices the `{...}` object starting at the beginning of `text`, honoring
/// nesting and string literals. An unterminated object returns the rest of
/// the text, which then fails to parse as JSON.
fn balanced_object(text: &str) -> &str {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escape_next => escape_next = false,
                '\\' => escape_next = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &text[..=idx];
                }
            }
            _ => {}
        }
    }

    text
}
