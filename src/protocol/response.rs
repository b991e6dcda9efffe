//! Response definitions
//!
//! Represents responses to clients.

/// Response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

/// A response to send to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status
    pub status: Status,

    /// Response text: an `OK:` acknowledgement, file content, a listing,
    /// or the error message (without the `ERROR: ` prefix)
    pub payload: String,
}

impl Response {
    /// Create an OK response carrying `payload` verbatim
    pub fn ok(payload: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            payload: payload.into(),
        }
    }

    /// Create an ERROR response
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            payload: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}
