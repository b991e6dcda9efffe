//! Protocol codec
//!
//! Parsing and formatting functions for the line protocol.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! ┌─────────┬───┬──────────┬───┬──────────────────────┬────┐
//! │ Keyword │ ' │   Name   │ ' │ Content (WRITE only) │ \n │
//! └─────────┴───┴──────────┴───┴──────────────────────┴────┘
//! ```
//!
//! ### Response
//! ```text
//! ┌──────────────────────────────────────────────┬────┐
//! │ Payload, or "ERROR: " + message              │ \n │
//! └──────────────────────────────────────────────┴────┘
//! ```
//!
//! ### Session End
//! `EXIT` (or `QUIT`) is answered with `OK: Bye` and the server then closes
//! the connection. Older servers closed without replying, so clients should
//! also accept end of stream after sending `EXIT`.

use std::io::{self, BufRead, Write};

use crate::error::{FsError, Result};

use super::{Command, CommandType, Response, Status};

/// Prefix marking an error response
pub const ERROR_PREFIX: &str = "ERROR: ";

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command as a request line (without the trailing newline)
pub fn encode_command(command: &Command) -> String {
    let keyword = command.command_type().keyword();

    match command {
        Command::Create { name } | Command::Read { name } | Command::Delete { name } => {
            format!("{} {}", keyword, name)
        }
        Command::Write { name, content } => format!("{} {} {}", keyword, name, content),
        Command::List | Command::Exit => keyword.to_string(),
    }
}

/// Parse a request line
///
/// Surrounding whitespace is ignored. WRITE takes everything after the
/// file name as content, spaces included.
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    if line.is_empty() {
        return Err(FsError::Protocol("empty command".to_string()));
    }

    let mut parts = line.splitn(3, ' ');
    let keyword = parts.next().unwrap_or_default().to_ascii_uppercase();
    let name = parts.next().map(str::to_string).filter(|n| !n.is_empty());
    let rest = parts.next().map(str::to_string);

    let require_name = |kind: CommandType| {
        name.clone().ok_or_else(|| {
            FsError::Protocol(format!("{} requires a filename", kind.keyword()))
        })
    };

    match keyword.as_str() {
        "CREATE" => Ok(Command::Create {
            name: require_name(CommandType::Create)?,
        }),
        "WRITE" => match (name.clone(), rest) {
            (Some(name), Some(content)) => Ok(Command::Write { name, content }),
            _ => Err(FsError::Protocol(
                "WRITE requires filename and content".to_string(),
            )),
        },
        "READ" => Ok(Command::Read {
            name: require_name(CommandType::Read)?,
        }),
        "DELETE" => Ok(Command::Delete {
            name: require_name(CommandType::Delete)?,
        }),
        "LIST" => Ok(Command::List),
        "EXIT" | "QUIT" => Ok(Command::Exit),
        _ => Err(FsError::Protocol(format!("Unknown command: {}", keyword))),
    }
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response as a line (without the trailing newline)
///
/// Embedded line breaks are replaced by spaces so one response always
/// occupies exactly one line.
pub fn encode_response(response: &Response) -> String {
    let payload = response.payload.replace(['\r', '\n'], " ");
    match response.status {
        Status::Ok => payload,
        Status::Error => format!("{}{}", ERROR_PREFIX, payload),
    }
}

/// Decode a response line
pub fn decode_response(line: &str) -> Response {
    let line = line.trim_end_matches(['\r', '\n']);
    match line.strip_prefix(ERROR_PREFIX) {
        Some(message) => Response::error(message),
        None => Response::ok(line),
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one request line from a stream
///
/// Returns `Ok(None)` at end of stream.
pub fn read_command<R: BufRead>(reader: &mut R) -> Result<Option<Command>> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) => Ok(None),
        Ok(_) => parse_command(&line).map(Some),
        Err(e) if e.kind() == io::ErrorKind::InvalidData => Err(FsError::Protocol(
            "request is not valid UTF-8".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writeln!(writer, "{}", encode_command(command))?;
    writer.flush()?;
    Ok(())
}

/// Read one response line from a stream
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<Response> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(FsError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "server closed the connection",
        )));
    }
    Ok(decode_response(&line))
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writeln!(writer, "{}", encode_response(response))?;
    writer.flush()?;
    Ok(())
}
