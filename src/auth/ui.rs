//! Interactive prompts for the login and signup flows.

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::fmt;
use std::io::{self, Write};

#[derive(Debug, Clone)]
pub struct UiError {
    message: String,
}

impl UiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UiError {}

pub fn prompt_line(label: &str) -> Result<String, UiError> {
    print!("{label}");
    io::stdout()
        .flush()
        .map_err(|err| UiError::new(err.to_string()))?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|err| UiError::new(err.to_string()))?;
    Ok(input.trim().to_string())
}

/// Read a password with echo replaced by asterisks. Raw mode is restored on
/// every exit path, including cancellation via Ctrl+C or Esc.
pub fn prompt_password(label: &str) -> Result<String, UiError> {
    print!("{label}");
    io::stdout()
        .flush()
        .map_err(|err| UiError::new(err.to_string()))?;

    enable_raw_mode().map_err(|err| UiError::new(err.to_string()))?;
    let result = read_masked_line();
    let restore = disable_raw_mode();
    println!();

    restore.map_err(|err| UiError::new(err.to_string()))?;
    result
}

fn read_masked_line() -> Result<String, UiError> {
    let mut password = String::new();
    loop {
        let event = event::read().map_err(|err| UiError::new(err.to_string()))?;
        let Event::Key(key) = event else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(password),
            KeyCode::Esc => return Err(UiError::new("Cancelled")),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(UiError::new("Cancelled"));
            }
            KeyCode::Backspace => {
                if password.pop().is_some() {
                    print!("\u{8} \u{8}");
                    let _ = io::stdout().flush();
                }
            }
            KeyCode::Char(c) => {
                password.push(c);
                print!("*");
                let _ = io::stdout().flush();
            }
            _ => {}
        }
    }
}

/// Plain y/N confirmation used by the destructive CLI commands.
pub fn confirm(question: &str) -> Result<bool, UiError> {
    let answer = prompt_line(&format!("{question} (y/N): "))?;
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}
