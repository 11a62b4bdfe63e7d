//! Console command grammar.

use crate::error::InputError;
use crate::position::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    /// Hands already show this position; record it without moving.
    SetTime(Position),
    Advance(u32),
    SetBack(u32),
    SetTimezone(String),
    ListTimezones,
    Sync,
    Save,
    Run,
    Help,
    Quit,
}

/// Parse one console line. Keywords are case-insensitive; arguments keep
/// their case.
pub fn parse(line: &str) -> Result<Command, InputError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    let keyword = word.to_ascii_lowercase();

    if let Some(n) = keyword.strip_prefix('+') {
        return parse_count(n, rest).map(Command::Advance);
    }
    if let Some(n) = keyword.strip_prefix('-') {
        return parse_count(n, rest).map(Command::SetBack);
    }

    let cmd = match keyword.as_str() {
        "s" | "status" => Command::Status,
        "h" | "help" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        "sync" => Command::Sync,
        "save" => Command::Save,
        "run" => Command::Run,
        "t" => {
            if rest.is_empty() {
                return Err(InputError::MissingArgument("t"));
            }
            Command::SetTime(parse_clock_time(rest)?)
        }
        "z" => {
            if rest.is_empty() {
                return Err(InputError::MissingArgument("z"));
            }
            if rest.eq_ignore_ascii_case("list") {
                Command::ListTimezones
            } else {
                Command::SetTimezone(parse_url(rest)?)
            }
        }
        _ => return Err(InputError::Unknown(line.to_string())),
    };

    // Bare keywords take no argument.
    if !rest.is_empty() && !matches!(keyword.as_str(), "t" | "z") {
        return Err(InputError::Unknown(line.to_string()));
    }
    Ok(cmd)
}

/// Parse `HH:MM` or `HH:MM:SS` (24-hour) into a dial position.
pub fn parse_clock_time(value: &str) -> Result<Position, InputError> {
    let invalid = || InputError::InvalidTime(value.to_string());
    let parts: Vec<&str> = value.trim().split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(invalid());
    }
    let field = |s: &str, max: u8| -> Result<u8, InputError> {
        match s.parse::<u8>() {
            Ok(v) if v <= max => Ok(v),
            _ => Err(invalid()),
        }
    };
    let hours = field(parts[0], 23)?;
    let minutes = field(parts[1], 59)?;
    if let Some(seconds) = parts.get(2) {
        field(seconds, 59)?;
    }
    Ok(Position::from_hm(hours, minutes))
}

fn parse_count(digits: &str, rest: &str) -> Result<u32, InputError> {
    // Accept both "+5" and "+ 5".
    let raw = if digits.is_empty() { rest } else { digits };
    if raw.is_empty() || (!digits.is_empty() && !rest.is_empty()) {
        return Err(InputError::InvalidCount(format!("{digits}{rest}")));
    }
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(InputError::InvalidCount(raw.to_string())),
    }
}

fn parse_url(raw: &str) -> Result<String, InputError> {
    let lower = raw.to_ascii_lowercase();
    if (lower.starts_with("http://") || lower.starts_with("https://"))
        && !raw.contains(char::is_whitespace)
    {
        Ok(raw.to_string())
    } else {
        Err(InputError::InvalidUrl(raw.to_string()))
    }
}
