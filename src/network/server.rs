//! TCP Server
//!
//! Accepts connections and dispatches them to a fixed pool of worker
//! threads over a bounded channel.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel;

use crate::config::Config;
use crate::error::{FsError, Result};
use crate::manager::FileSystem;
use crate::storage::BlockDevice;

use super::Connection;

/// TCP server for blockfs
pub struct Server<D: BlockDevice + 'static> {
    config: Config,
    fs: Arc<FileSystem<D>>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
}

/// Stops a running server from another thread
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    addr: SocketAddr,
}

impl ShutdownHandle {
    /// Ask the accept loop to stop
    ///
    /// Workers finish their current connections before `run` returns.
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        // Wake the blocking accept() so it observes the flag
        let _ = TcpStream::connect(self.addr);
    }
}

impl<D: BlockDevice + 'static> Server<D> {
    /// Bind the listen address from `config`
    ///
    /// Every connection shares the one `fs` handle.
    pub fn bind(config: Config, fs: Arc<FileSystem<D>>) -> Result<Self> {
        if config.max_connections == 0 {
            return Err(FsError::Config(
                "max connections must be non-zero".to_string(),
            ));
        }

        let listener = TcpListener::bind(&config.listen_addr)?;

        Ok(Self {
            config,
            fs,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        Ok(ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            addr: self.local_addr()?,
        })
    }

    /// Accept connections until shut down (blocking)
    pub fn run(&self) -> Result<()> {
        let worker_count = self.config.max_connections;
        let (sender, receiver) = channel::bounded::<TcpStream>(worker_count);

        let mut workers: Vec<JoinHandle<()>> = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let receiver = receiver.clone();
            let fs = Arc::clone(&self.fs);
            let read_ms = self.config.read_timeout_ms;
            let write_ms = self.config.write_timeout_ms;

            let handle = thread::Builder::new()
                .name(format!("blockfs-worker-{}", id))
                .spawn(move || {
                    for stream in receiver.iter() {
                        serve(stream, Arc::clone(&fs), read_ms, write_ms);
                    }
                })?;
            workers.push(handle);
        }
        drop(receiver);

        tracing::info!(
            "Listening on {} with {} workers",
            self.local_addr()?,
            worker_count
        );

        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }
            match stream {
                Ok(stream) => {
                    if sender.send(stream).is_err() {
                        tracing::error!("All workers exited; stopping accept loop");
                        break;
                    }
                }
                Err(e) => tracing::warn!("Failed to accept connection: {}", e),
            }
        }

        drop(sender);
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }

        tracing::info!("Server stopped accepting connections");
        Ok(())
    }
}

/// Run one connection to completion on the current worker
fn serve<D: BlockDevice>(stream: TcpStream, fs: Arc<FileSystem<D>>, read_ms: u64, write_ms: u64) {
    let mut connection = match Connection::new(stream, fs) {
        Ok(connection) => connection,
        Err(e) => {
            tracing::warn!("Failed to set up connection: {}", e);
            return;
        }
    };

    if let Err(e) = connection.set_timeouts(read_ms, write_ms) {
        tracing::warn!("Failed to set timeouts for {}: {}", connection.peer_addr(), e);
    }

    if let Err(e) = connection.handle() {
        tracing::warn!("Connection {} closed with error: {}", connection.peer_addr(), e);
    }
}
