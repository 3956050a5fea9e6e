//! Tokenizing and parsing of prompt input.

use std::path::PathBuf;

use crate::command::Command;
use crate::error::ParseError;

/// Parse one line of user input.
///
/// Returns `Ok(None)` for blank input. The first token selects the command
/// by full name or short alias; the rest are arguments, split with
/// shell-like quoting.
///
/// # Errors
///
/// Returns [`ParseError`] for unknown commands, unbalanced quotes, and
/// per-command argument violations.
pub fn parse(input: &str) -> Result<Option<Command>, ParseError> {
    let args = shlex::split(input).ok_or(ParseError::UnbalancedQuotes)?;
    let Some((name, rest)) = args.split_first() else {
        return Ok(None);
    };
    let cmd = match name.as_str() {
        "backtrace" | "bt" => Command::Backtrace,
        "break" | "b" => parse_break(rest)?,
        "continue" | "c" => Command::Continue,
        "down" | "dow" => Command::Down(parse_count(rest)?),
        "evaluate" | "eval" | "e" => parse_evaluate(rest)?,
        "launch" | "l" => parse_launch(rest)?,
        "pause" | "p" => Command::Pause,
        "quit" | "q" => Command::Quit,
        "up" => Command::Up(parse_count(rest)?),
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Some(cmd))
}

fn parse_break(args: &[String]) -> Result<Command, ParseError> {
    let [file, line] = args else {
        return Err(ParseError::Usage("break <file> <line>"));
    };
    let file = std::path::absolute(file).map_err(|e| ParseError::InvalidPath {
        path: file.clone(),
        reason: e.to_string(),
    })?;
    let line = parse_positive(line)?;
    Ok(Command::Break { file, line })
}

fn parse_launch(args: &[String]) -> Result<Command, ParseError> {
    match args {
        [] => Err(ParseError::Usage("launch <name>")),
        [name] => Ok(Command::Launch { name: name.clone() }),
        _ => Err(ParseError::Usage("launch <name>")),
    }
}

fn parse_evaluate(args: &[String]) -> Result<Command, ParseError> {
    if args.is_empty() {
        return Err(ParseError::Usage("evaluate <expression>"));
    }
    Ok(Command::Evaluate {
        expr: args.join(" "),
    })
}

/// Optional frame count for `up`/`down`; defaults to 1.
fn parse_count(args: &[String]) -> Result<usize, ParseError> {
    match args {
        [] => Ok(1),
        [n] => {
            let n = parse_positive(n)?;
            Ok(n as usize)
        }
        _ => Err(ParseError::Usage("up/down [count]")),
    }
}

fn parse_positive(input: &str) -> Result<i64, ParseError> {
    match input.parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseError::InvalidNumber(input.to_string())),
    }
}
