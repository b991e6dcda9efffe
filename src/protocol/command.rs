//! Command definitions
//!
//! Represents requests from clients.

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Create,
    Write,
    Read,
    Delete,
    List,
    Exit,
}

impl CommandType {
    /// Keyword used on the wire
    pub fn keyword(&self) -> &'static str {
        match self {
            CommandType::Create => "CREATE",
            CommandType::Write => "WRITE",
            CommandType::Read => "READ",
            CommandType::Delete => "DELETE",
            CommandType::List => "LIST",
            CommandType::Exit => "EXIT",
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create an empty file
    Create { name: String },

    /// Replace a file's content
    Write { name: String, content: String },

    /// Read a file's content
    Read { name: String },

    /// Delete a file
    Delete { name: String },

    /// List all files with their sizes
    List,

    /// End the session
    Exit,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Create { .. } => CommandType::Create,
            Command::Write { .. } => CommandType::Write,
            Command::Read { .. } => CommandType::Read,
            Command::Delete { .. } => CommandType::Delete,
            Command::List => CommandType::List,
            Command::Exit => CommandType::Exit,
        }
    }
}
