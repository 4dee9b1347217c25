// ============================================================================
// Connection Interface
// Source of decoded commands for one client session
// ============================================================================

use crate::domain::Command;
use crate::protocol::ParseError;
use crossbeam::channel::Receiver;
use thiserror::Error;

/// Errors surfaced while reading the next command
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// The transport failed; the session ends
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    /// One unusable line; the session carries on with the next
    #[error("malformed command {line:?}: {source}")]
    Malformed {
        line: String,
        #[source]
        source: ParseError,
    },
}

impl ConnectionError {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionError::Io(_))
    }
}

/// A client session's command stream.
///
/// `Ok(None)` marks the end of the stream.
pub trait Connection {
    fn read_next_command(&mut self) -> Result<Option<Command>, ConnectionError>;
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn read_next_command(&mut self) -> Result<Option<Command>, ConnectionError> {
        (**self).read_next_command()
    }
}

/// In-process session fed through a channel.
///
/// The stream ends once every sender has been dropped and the queue drained.
pub struct ChannelConnection {
    commands: Receiver<Command>,
}

impl ChannelConnection {
    pub fn new(commands: Receiver<Command>) -> Self {
        Self { commands }
    }
}

impl Connection for ChannelConnection {
    fn read_next_command(&mut self) -> Result<Option<Command>, ConnectionError> {
        Ok(self.commands.recv().ok())
    }
}
