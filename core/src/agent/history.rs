use crate::agent::parser::Action;

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    Query(String),
    Thought(String),
    Action(Action),
    Observation(String),
}

impl HistoryEntry {
    pub fn render(&self) -> String {
        match self {
            Self::Query(text) => text.clone(),
            Self::Thought(text) => format!("THOUGHT: {}", text),
            Self::Action(action) => format!("ACTION: {}", action.render()),
            Self::Observation(text) => format!("OBSERVATION: {}", text),
        }
    }
}

/// Append-only record of one run, serialized on demand for each model call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationHistory {
    entries: Vec<HistoryEntry>,
}

impl ConversationHistory {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            entries: vec![HistoryEntry::Query(query.into())],
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(HistoryEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value, json};

    #[test]
    fn renders_entries_in_order() {
        let mut history = ConversationHistory::new("How many books?");
        history.push(HistoryEntry::Thought("Count rows.".into()));
        let arguments: Map<String, Value> = json!({"query": "SELECT COUNT(*) FROM books"})
            .as_object()
            .cloned()
            .unwrap();
        history.push(HistoryEntry::Action(Action::new("query_database", arguments)));
        history.push(HistoryEntry::Observation("7".into()));

        assert_eq!(
            history.render(),
            "How many books?\n\
             THOUGHT: Count rows.\n\
             ACTION: query_database{\"query\":\"SELECT COUNT(*) FROM books\"}\n\
             OBSERVATION: 7"
        );
        assert_eq!(history.len(), 4);
    }
}
