use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

#[derive(Debug, PartialEq, Eq)]
pub enum InputResult {
    Message(String),
    History,
    Help,
    Retry,
    Exit,
}

/// Read one line and classify it.
pub fn get_input(editor: &mut DefaultEditor) -> anyhow::Result<InputResult> {
    let line = match editor.readline("( O)> ") {
        Ok(line) => line,
        Err(ReadlineError::Interrupted) => return Ok(InputResult::Retry),
        Err(ReadlineError::Eof) => return Ok(InputResult::Exit),
        Err(e) => return Err(e.into()),
    };

    if !line.trim().is_empty() {
        editor.add_history_entry(line.as_str())?;
    }
    Ok(parse_input(&line))
}

pub fn parse_input(line: &str) -> InputResult {
    let trimmed = line.trim();
    match trimmed {
        "" => InputResult::Retry,
        "/exit" | "/quit" | "exit" | "quit" => InputResult::Exit,
        "/history" => InputResult::History,
        "/help" | "/?" => InputResult::Help,
        _ => InputResult::Message(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_recognized() {
        assert_eq!(parse_input("/exit"), InputResult::Exit);
        assert_eq!(parse_input("  /quit "), InputResult::Exit);
        assert_eq!(parse_input("/history"), InputResult::History);
        assert_eq!(parse_input("/?"), InputResult::Help);
    }

    #[test]
    fn blank_lines_retry_and_text_is_trimmed() {
        assert_eq!(parse_input("   "), InputResult::Retry);
        assert_eq!(
            parse_input("  12 * (7 + 3)\n"),
            InputResult::Message("12 * (7 + 3)".to_string())
        );
    }
}
