//! The interactive prompt.
//!
//! A dedicated thread blocks on rustyline reading lines, parses them,
//! and forwards commands to the router; an async task drains the
//! router's display lines through rustyline's external printer so output
//! never corrupts the line being edited.

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, ExternalPrinter};
use tokio::sync::mpsc;
use tracing::{debug, error};

use pesticide_command::Command;

use crate::router::Input;

const PROMPT: &str = "(pesticide) ";

/// Run the prompt until the router closes the output channel.
pub async fn run(
    input_tx: mpsc::Sender<Input>,
    mut output_rx: mpsc::Receiver<String>,
) -> Result<()> {
    let mut editor = DefaultEditor::new().context("failed to initialize line editor")?;
    let mut printer = editor
        .create_external_printer()
        .context("failed to create prompt printer")?;

    std::thread::spawn(move || read_loop(editor, input_tx));

    while let Some(line) = output_rx.recv().await {
        if printer.print(format!("{line}\n")).is_err() {
            break;
        }
    }
    Ok(())
}

/// Blocking line-reader loop. Exits when the router is gone or stdin is
/// closed.
fn read_loop(mut editor: DefaultEditor, input_tx: mpsc::Sender<Input>) {
    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(&line);
                }
                debug!("user command: '{line}'");
                match pesticide_command::parse(&line) {
                    Ok(Some(cmd)) => {
                        if input_tx.blocking_send(Input::Command(cmd)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                }
            }
            // Ctrl-C suspends the focused session, like the interrupt key
            // in a conventional debugger.
            Err(ReadlineError::Interrupted) => {
                if input_tx
                    .blocking_send(Input::Command(Command::Pause))
                    .is_err()
                {
                    break;
                }
            }
            Err(ReadlineError::Eof) => {
                let _ = input_tx.blocking_send(Input::Command(Command::Quit));
                break;
            }
            Err(e) => {
                error!("failed to read from prompt: {e}");
                break;
            }
        }
    }
}
