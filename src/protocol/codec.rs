// ============================================================================
// Line Codec
// Text commands, one per line:
//   B <order_id> <instrument> <price> <count>
//   S <order_id> <instrument> <price> <count>
//   C <order_id>
// ============================================================================

use crate::domain::{Command, CommandKind, OrderId};
use crate::interfaces::{Connection, ConnectionError};
use std::io::BufRead;
use std::sync::Arc;
use thiserror::Error;

/// Why a command line could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command type {0:?}")]
    UnknownCommand(String),

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("unexpected trailing input {0:?}")]
    TrailingInput(String),

    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

/// Decode one command line
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let mut fields = line.split_whitespace();
    let kind = match fields.next() {
        None => return Err(ParseError::Empty),
        Some("B") => CommandKind::Buy,
        Some("S") => CommandKind::Sell,
        Some("C") => CommandKind::Cancel,
        Some(other) => return Err(ParseError::UnknownCommand(other.to_string())),
    };

    let order_id = OrderId(number(fields.next(), "order_id")?);

    let command = match kind {
        CommandKind::Cancel => Command {
            kind,
            order_id,
            instrument: Arc::from(""),
            price: 0,
            count: 0,
        },
        CommandKind::Buy | CommandKind::Sell => {
            let instrument = fields.next().ok_or(ParseError::MissingField("instrument"))?;
            Command {
                kind,
                order_id,
                instrument: Arc::from(instrument),
                price: number(fields.next(), "price")?,
                count: number(fields.next(), "count")?,
            }
        },
    };

    if let Some(extra) = fields.next() {
        return Err(ParseError::TrailingInput(extra.to_string()));
    }

    Ok(command)
}

/// Encode a command in the line format accepted by [`parse_command`]
pub fn format_command(command: &Command) -> String {
    match command.kind {
        CommandKind::Cancel => format!("C {}", command.order_id),
        CommandKind::Buy | CommandKind::Sell => format!(
            "{} {} {} {} {}",
            if command.kind == CommandKind::Buy { 'B' } else { 'S' },
            command.order_id,
            command.instrument,
            command.price,
            command.count
        ),
    }
}

fn number(field: Option<&str>, name: &'static str) -> Result<u32, ParseError> {
    let raw = field.ok_or(ParseError::MissingField(name))?;
    raw.parse().map_err(|_| ParseError::InvalidNumber {
        field: name,
        value: raw.to_string(),
    })
}

// ============================================================================
// Line Connection
// ============================================================================

/// [`Connection`] over any buffered reader: TCP stream, stdin, bytes.
///
/// Blank lines are skipped. Undecodable lines, invalid UTF-8 included,
/// surface as non-terminal [`ConnectionError::Malformed`] errors.
pub struct LineConnection<R: BufRead> {
    reader: R,
    line: Vec<u8>,
}

impl<R: BufRead> LineConnection<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead> Connection for LineConnection<R> {
    fn read_next_command(&mut self) -> Result<Option<Command>, ConnectionError> {
        loop {
            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line)? == 0 {
                return Ok(None);
            }

            let Ok(text) = std::str::from_utf8(&self.line) else {
                return Err(ConnectionError::Malformed {
                    line: String::from_utf8_lossy(&self.line).trim().to_string(),
                    source: ParseError::InvalidUtf8,
                });
            };

            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }

            return parse_command(trimmed)
                .map(Some)
                .map_err(|source| ConnectionError::Malformed {
                    line: trimmed.to_string(),
                    source,
                });
        }
    }
}
