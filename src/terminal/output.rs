use console::style;

use crate::agent::AgentStep;
use crate::chat::ChatRole;

/// Spinner shown while the agent works.
#[derive(Default)]
pub struct ThinkingIndicator {
    spinner: Option<cliclack::ProgressBar>,
}

impl ThinkingIndicator {
    pub fn show(&mut self) {
        let spinner = cliclack::spinner();
        spinner.start("Thinking...");
        self.spinner = Some(spinner);
    }

    pub fn hide(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop("");
        }
    }
}

pub fn display_intro() -> std::io::Result<()> {
    cliclack::intro(style(" mathbot ").on_cyan().black())
}

pub fn render_message(role: ChatRole, content: &str) {
    match role {
        ChatRole::User => println!("{} {}", style("you:").cyan().bold(), content),
        ChatRole::Assistant => println!("{} {}", style("assistant:").green().bold(), content),
    }
}

/// Collapsed view of the agent's tool calls.
pub fn render_steps(steps: &[AgentStep]) {
    for step in steps {
        println!(
            "  {} {} {}",
            style("▸").dim(),
            style(&step.tool).cyan(),
            style(one_line(&step.input, 80)).dim()
        );
        println!("    {}", style(one_line(&step.observation, 120)).dim().italic());
    }
}

pub fn render_success(answer: &str) {
    println!("\n {} \n", style(answer).on_green().black());
}

pub fn render_error(message: &str) {
    println!("\n  {} {}\n", style("error:").red().bold(), message);
}

pub fn render_notice(message: &str) {
    println!("\n{}", style(message).yellow());
}

pub fn render_help() {
    println!(
        "{}\n  {}  show the conversation\n  {}  leave (or Ctrl-D)",
        style("Commands:").bold(),
        style("/history").cyan(),
        style("/exit").cyan()
    );
}

fn one_line(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_flattens_and_truncates() {
        assert_eq!(one_line("Page: Alan Turing\nSummary: ...", 80), "Page: Alan Turing Summary: ...");
        assert_eq!(one_line("abcdef", 3), "abc…");
    }
}
