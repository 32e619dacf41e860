use console::{Style, style};
use quarry_core::{EventSink, RunReport, StepEvent};

/// Prints each loop event as a titled panel on stdout.
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&self, event: &StepEvent) {
        let step = event.step();
        match event {
            StepEvent::Thought { text, .. } => {
                panel(&format!("Step {}: Thought", step), text, Style::new().white())
            }
            StepEvent::Action {
                name, arguments, ..
            } => panel(
                &format!("Step {}: Action", step),
                &format!("{}({})", name, serde_json::Value::Object(arguments.clone())),
                Style::new().yellow(),
            ),
            StepEvent::Observation { text, .. } => panel(
                &format!("Step {}: Observation", step),
                text,
                Style::new().blue(),
            ),
            StepEvent::Final { answer, .. } => {
                panel("Final Answer", answer, Style::new().green().bold())
            }
        }
    }
}

pub fn panel(title: &str, body: &str, color: Style) {
    println!("{}", color.apply_to(format!("── {} ──", title)));
    for line in body.lines() {
        println!("  {}", line);
    }
    println!();
}

pub fn report(report: &RunReport) {
    if report.ran_out_of_steps() {
        println!(
            "{} {}",
            style("!").yellow().bold(),
            out_of_steps_message(report.steps)
        );
    }
}

fn out_of_steps_message(steps: usize) -> String {
    match steps {
        1 => "Ran out of steps after 1 step without a final answer.".to_string(),
        n => format!("Ran out of steps after {} steps without a final answer.", n),
    }
}

pub fn error(title: &str, message: &str) {
    eprintln!("{}", style(format!("── {} ──", title)).red().bold());
    eprintln!("  {}", style(message).red());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_steps_message_names_the_unit() {
        assert_eq!(
            out_of_steps_message(10),
            "Ran out of steps after 10 steps without a final answer."
        );
        assert_eq!(
            out_of_steps_message(1),
            "Ran out of steps after 1 step without a final answer."
        );
    }
}
