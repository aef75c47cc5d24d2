//! Turns stdin lines into panel events.

use std::{
    io::{self, BufRead},
    thread,
};

use tokio::sync::mpsc;
use window_core::{PanelEvent, WindowAction};

pub const HELP: &str = "text = edit location | <enter> or /search = search | /pick N | \
/open /stop /close | /clear | /quit";

/// Parse one line typed at the panel prompt.
pub fn parse_line(line: &str) -> Result<PanelEvent, String> {
    let trimmed = line.trim();

    let Some(command) = trimmed.strip_prefix('/') else {
        if trimmed.is_empty() {
            return Ok(PanelEvent::Search);
        }
        return Ok(PanelEvent::Input(line.trim_end_matches(['\r', '\n']).to_string()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "search" => Ok(PanelEvent::Search),
        "clear" => Ok(PanelEvent::Input(String::new())),
        "quit" | "q" => Ok(PanelEvent::Quit),
        "pick" => {
            let n: usize = arg
                .parse()
                .map_err(|_| format!("'/pick' needs a suggestion number, got '{arg}'"))?;
            if n == 0 {
                return Err("suggestions are numbered from 1".to_string());
            }
            Ok(PanelEvent::Pick(n - 1))
        }
        "select" if !arg.is_empty() => Ok(PanelEvent::Select(arg.to_string())),
        other => WindowAction::try_from(other)
            .map(PanelEvent::Command)
            .map_err(|_| format!("unknown command '/{other}'. {HELP}")),
    }
}

/// Read stdin on a dedicated thread. EOF or `/quit` ends the thread, which
/// drops the sender and so stops the panel.
pub fn spawn_reader(tx: mpsc::Sender<PanelEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read stdin");
                    break;
                }
            };

            match parse_line(&line) {
                Ok(event) => {
                    let quit = event == PanelEvent::Quit;
                    if tx.blocking_send(event).is_err() || quit {
                        break;
                    }
                }
                Err(msg) => eprintln!("{msg}"),
            }
        }
    })
}
