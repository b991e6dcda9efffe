//! TCP Client
//!
//! Blocking request/response client for the line protocol.

use std::io::{BufReader, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{FsError, Result};
use crate::protocol::{read_response, write_command, Command, Response};

/// A connection to a blockfs server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to the server at `addr`
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Send a command and wait for its response
    pub fn send(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }

    /// Send a raw request line and wait for its response
    pub fn send_line(&mut self, line: &str) -> Result<Response> {
        if line.contains('\n') {
            return Err(FsError::Protocol(
                "request must be a single line".to_string(),
            ));
        }
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        read_response(&mut self.reader)
    }

    pub fn create(&mut self, name: &str) -> Result<Response> {
        self.send(&Command::Create {
            name: name.to_string(),
        })
    }

    pub fn write(&mut self, name: &str, content: &str) -> Result<Response> {
        self.send(&Command::Write {
            name: name.to_string(),
            content: content.to_string(),
        })
    }

    pub fn read(&mut self, name: &str) -> Result<Response> {
        self.send(&Command::Read {
            name: name.to_string(),
        })
    }

    pub fn delete(&mut self, name: &str) -> Result<Response> {
        self.send(&Command::Delete {
            name: name.to_string(),
        })
    }

    pub fn list(&mut self) -> Result<Response> {
        self.send(&Command::List)
    }

    /// End the session
    pub fn exit(mut self) -> Result<Response> {
        self.send(&Command::Exit)
    }
}
