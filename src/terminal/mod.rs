//! Interactive terminal chat.

mod input;
mod output;

use crate::chat::{ChatError, ChatRole, ChatSession};
use crate::config::{ApiKey, Config, MISSING_KEY_NOTICE};

use input::InputResult;
use output::ThinkingIndicator;

/// Run the chat until the user leaves.
pub async fn run(config: Config) -> anyhow::Result<()> {
    output::display_intro()?;

    let api_key = match config.api_key.clone() {
        Some(key) => key,
        None => {
            let raw: String = cliclack::password("Groq API key")
                .mask('▪')
                .interact()?;
            match ApiKey::parse(&raw) {
                Ok(key) => key,
                Err(_) => {
                    cliclack::outro(console::style(MISSING_KEY_NOTICE).yellow())?;
                    return Ok(());
                }
            }
        }
    };

    let config = config.with_api_key(api_key);
    let mut session = ChatSession::from_config(&config)?;
    session.initialize();
    for (role, content) in session.render() {
        output::render_message(role, content);
    }

    let mut editor = rustyline::DefaultEditor::new()?;
    let mut thinking = ThinkingIndicator::default();

    loop {
        match input::get_input(&mut editor)? {
            InputResult::Message(text) => {
                thinking.show();
                let result = session.submit(&text).await;
                thinking.hide();

                match result {
                    Ok(turn) => {
                        if config.show_agent_steps {
                            output::render_steps(&turn.steps);
                        }
                        output::render_message(ChatRole::Assistant, &turn.answer);
                        output::render_success(&turn.answer);
                    }
                    Err(ChatError::Configuration(e)) => {
                        output::render_notice(&e.to_string());
                        break;
                    }
                    Err(e) => output::render_error(&e.to_string()),
                }
            }
            InputResult::History => {
                for (role, content) in session.render() {
                    output::render_message(role, content);
                }
            }
            InputResult::Help => output::render_help(),
            InputResult::Retry => continue,
            InputResult::Exit => break,
        }
    }

    let transcript = session.dispose();
    tracing::debug!(messages = transcript.len(), "Chat ended");
    cliclack::outro("Goodbye")?;
    Ok(())
}
