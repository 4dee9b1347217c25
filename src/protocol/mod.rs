// ============================================================================
// Protocol Module
// Text line codec and reader-backed connections
// ============================================================================

mod codec;

pub use codec::{format_command, parse_command, LineConnection, ParseError};
