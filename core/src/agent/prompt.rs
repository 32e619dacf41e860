use crate::agent::history::ConversationHistory;
use crate::traits::ToolSpec;
use std::fmt::Write;

pub const PROTOCOL_REMINDER: &str =
    "Always follow the THOUGHT–ACTION–OBSERVATION–FINAL ANSWER structure.";

/// The user-turn text for one model call: the whole history followed by the
/// standing protocol reminder.
pub fn render_turn(history: &ConversationHistory) -> String {
    format!("{}\n{}", history.render(), PROTOCOL_REMINDER)
}

pub struct PromptBuilder {
    pub schema_summary: String,
    pub tool_specs: Vec<ToolSpec>,
}

impl PromptBuilder {
    pub fn new(schema_summary: impl Into<String>) -> Self {
        Self {
            schema_summary: schema_summary.into(),
            tool_specs: vec![],
        }
    }

    pub fn with_tool_specs(mut self, tool_specs: Vec<ToolSpec>) -> Self {
        self.tool_specs = tool_specs;
        self
    }

    pub fn build_system_prompt(&self) -> String {
        let mut parts = vec![self.get_role_and_schema(), self.get_protocol()];
        if let Some(tools) = self.get_tool_listing() {
            parts.push(tools);
        }
        parts.push(self.get_rules());
        parts.join("\n\n")
    }

    fn get_role_and_schema(&self) -> String {
        format!(
            "You are a helpful SQL Database Agent that interacts with a SQLite database in read-only mode.\n\nDatabase schema:\n{}",
            self.schema_summary
        )
    }

    fn get_protocol(&self) -> String {
        "Respond strictly in this reasoning structure:\n\
         THOUGHT: <reasoning>\n\
         ACTION: <tool_name>{\"<arg>\":\"<value>\"}\n\
         OBSERVATION: <tool output>\n\
         THOUGHT: <final reasoning>\n\
         FINAL ANSWER: <answer to user>\n\
         Emit at most one ACTION per reply and wait for its OBSERVATION."
            .to_string()
    }

    fn get_tool_listing(&self) -> Option<String> {
        if self.tool_specs.is_empty() {
            return None;
        }

        let mut listing = String::from("Available tools:\n");
        for tool in &self.tool_specs {
            let _ = writeln!(
                listing,
                "- {}: {} Parameters: {}",
                tool.name, tool.description, tool.parameters_schema
            );
        }
        Some(listing.trim_end().to_string())
    }

    fn get_rules(&self) -> String {
        "Rules:\n\
         - Use only SELECT statements.\n\
         - Never modify the database.\n\
         - Match column and table names exactly."
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ListTablesTool;
    use crate::traits::Tool;

    #[test]
    fn system_prompt_carries_schema_grammar_and_rules() {
        let prompt = PromptBuilder::new("- books (book_id, title)")
            .with_tool_specs(vec![ListTablesTool.spec()])
            .build_system_prompt();

        assert!(prompt.contains("Database schema:\n- books (book_id, title)"));
        assert!(prompt.contains("FINAL ANSWER: <answer to user>"));
        assert!(prompt.contains("- list_tables: Lists all tables"));
        assert!(prompt.contains("- Use only SELECT statements."));
        assert!(prompt.contains("- Never modify the database."));
    }

    #[test]
    fn tool_listing_omitted_without_tools() {
        let prompt = PromptBuilder::new("").build_system_prompt();
        assert!(!prompt.contains("Available tools"));
    }

    #[test]
    fn turn_ends_with_reminder() {
        let turn = render_turn(&ConversationHistory::new("List all tables"));
        assert_eq!(turn, format!("List all tables\n{}", PROTOCOL_REMINDER));
    }
}
