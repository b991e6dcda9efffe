//! blockfs CLI Client
//!
//! Command-line interface for interacting with a blockfs server.

use std::io::{self, BufRead, Write};

use blockfs::network::Client;
use blockfs::protocol::{encode_response, Command, Response};
use clap::{Parser, Subcommand};

/// blockfs CLI
#[derive(Parser, Debug)]
#[command(name = "blockfs-cli")]
#[command(about = "CLI for the blockfs file server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:12345")]
    server: String,

    /// Command to run; starts an interactive prompt when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty file
    Create {
        /// File name (at most 11 bytes)
        name: String,
    },

    /// Replace a file's content
    Write {
        /// File name
        name: String,

        /// New content
        content: String,
    },

    /// Print a file's content
    Read {
        /// File name
        name: String,
    },

    /// Delete a file
    Delete {
        /// File name
        name: String,
    },

    /// List all files
    List,
}

impl From<Commands> for Command {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Create { name } => Command::Create { name },
            Commands::Write { name, content } => Command::Write { name, content },
            Commands::Read { name } => Command::Read { name },
            Commands::Delete { name } => Command::Delete { name },
            Commands::List => Command::List,
        }
    }
}

fn main() {
    let args = Args::parse();

    let mut client = match Client::connect(&args.server) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    let code = match args.command {
        Some(command) => match client.send(&command.into()) {
            Ok(response) => print_response(&response),
            Err(e) => {
                eprintln!("Request failed: {}", e);
                1
            }
        },
        None => interactive(&mut client),
    };

    std::process::exit(code);
}

/// Print a response; returns the process exit code it implies
fn print_response(response: &Response) -> i32 {
    println!("{}", encode_response(response));
    if response.is_ok() {
        0
    } else {
        1
    }
}

/// Forward stdin lines to the server until EOF or EXIT
fn interactive(client: &mut Client) -> i32 {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("blockfs> ");
        let _ = stdout.flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => return 0,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Failed to read input: {}", e);
                return 1;
            }
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match client.send_line(line) {
            Ok(response) => {
                print_response(&response);
            }
            Err(e) => {
                eprintln!("Request failed: {}", e);
                return 1;
            }
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            return 0;
        }
    }
}
