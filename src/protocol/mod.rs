//! Protocol Module
//!
//! Defines the line-based wire protocol for client-server communication.
//!
//! ## Protocol Format
//!
//! One request per line, one response line per request. Keywords are
//! case-insensitive.
//!
//! ### Commands
//! - `CREATE <name>`
//! - `WRITE <name> <content>`  (content is the rest of the line)
//! - `READ <name>`
//! - `DELETE <name>`
//! - `LIST`
//! - `EXIT` / `QUIT`
//!
//! ### Responses
//! - `OK: <acknowledgement>` for CREATE, WRITE, DELETE and EXIT
//! - the raw content for READ
//! - `name (N bytes), ...` or `No files` for LIST
//! - `ERROR: <message>` on any failure

mod codec;
mod command;
mod response;

pub use codec::{
    decode_response, encode_command, encode_response, parse_command, read_command,
    read_response, write_command, write_response,
};
pub use command::{Command, CommandType};
pub use response::{Response, Status};
