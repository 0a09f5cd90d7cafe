//! Terminal input and prompt handling.

use std::io::Write;

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

pub const LOGIN_PROMPT: &str = "Login with your username: ";
pub const PROMPT: &str = "> ";

/// Redisplay the prompt after printing a server line
pub fn redisplay_prompt() {
    print!("{}", PROMPT);
    std::io::stdout().flush().ok();
}

/// Print a line from the server above the prompt
pub fn print_server_line(line: &str) {
    println!("\r{}", line);
    redisplay_prompt();
}

/// Read stdin with rustyline on a blocking thread.
///
/// The first line is read under the login prompt and is forwarded even when
/// blank, so the server can reject it. The channel closes on Ctrl+C, Ctrl+D
/// or a readline failure.
pub fn spawn_line_reader() -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let mut prompt = LOGIN_PROMPT;
        loop {
            match rl.readline(prompt) {
                Ok(line) => {
                    let line = line.trim();
                    let is_login = prompt == LOGIN_PROMPT;
                    prompt = PROMPT;
                    if line.is_empty() && !is_login {
                        continue;
                    }
                    if !is_login {
                        rl.add_history_entry(line).ok();
                    }
                    if input_tx.send(line.to_string()).is_err() {
                        // Channel closed, exit thread
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}
