//! Interactive input for commands that need it.

use anyhow::{bail, Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io::{IsTerminal, Write};

/// Read one line from stdin after printing `label` to stderr.
pub fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Read a password without echoing it. Piped input is read as a plain line.
pub fn prompt_secret(label: &str) -> Result<String> {
    if !std::io::stdin().is_terminal() {
        return prompt(label);
    }

    eprint!("{}", label);
    std::io::stderr().flush()?;

    let secret = {
        let _raw = RawMode::enable()?;
        read_secret()
    };
    eprintln!();
    secret
}

/// Keeps the terminal in raw mode (no echo, no line editing) while alive.
struct RawMode;

impl RawMode {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode().context("Failed to configure the terminal")?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::warn!(error = %e, "Failed to restore the terminal");
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SecretInput {
    Pending,
    Done,
    Cancelled,
}

fn read_secret() -> Result<String> {
    let mut secret = String::new();
    loop {
        let Event::Key(key) = event::read().context("Failed to read from the terminal")? else {
            continue;
        };
        match apply_key(&mut secret, key) {
            SecretInput::Pending => {}
            SecretInput::Done => return Ok(secret),
            SecretInput::Cancelled => bail!("Cancelled"),
        }
    }
}

fn apply_key(secret: &mut String, key: KeyEvent) -> SecretInput {
    if key.kind == KeyEventKind::Release {
        return SecretInput::Pending;
    }
    match key.code {
        KeyCode::Enter => SecretInput::Done,
        KeyCode::Esc => SecretInput::Cancelled,
        KeyCode::Char('c' | 'd') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            SecretInput::Cancelled
        }
        KeyCode::Backspace => {
            secret.pop();
            SecretInput::Pending
        }
        KeyCode::Char(c) => {
            secret.push(c);
            SecretInput::Pending
        }
        _ => SecretInput::Pending,
    }
}
