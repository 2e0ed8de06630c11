//! Daemon — hosts one conversation engine and config store for the process
//! lifetime and serves them over the Unix socket.
//!
//! The main loop only accepts connections. Each connection is handled on its
//! own worker thread, so events from different users run concurrently while
//! the engine serializes events of the same user. Workers talk back to the
//! main loop through an mpsc channel.
//!
//! # Main loop tick
//!
//! 1. Drain channel — stop if a shutdown was requested
//! 2. Accept one socket connection (non-blocking, sleep one poll interval if none)
//! 3. Reap finished workers

use std::io::ErrorKind;
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{info, warn};

use crate::engine::Engine;
use crate::error::ServiceError;
use crate::service::{handle_connection, HandleResult, ServiceSocket};
use crate::store::ConfigStore;


/// Events that can be sent to the daemon's main loop via the channel.
#[derive(Debug)]
pub enum DaemonEvent {
    /// Request the daemon to shut down gracefully.
    Shutdown,
}


/// Configuration for the daemon loop.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// How long to sleep when no connection is pending (milliseconds).
    pub poll_interval_ms: u64,
    /// Read timeout applied to each client connection (milliseconds).
    pub request_timeout_ms: u64,
}


impl Default for DaemonConfig {
    fn default() -> Self {
        DaemonConfig {
            poll_interval_ms: 50,
            request_timeout_ms: 10_000,
        }
    }
}


/// Handle allowing other threads to stop the daemon.
#[derive(Clone)]
pub struct DaemonHandle {
    sender: mpsc::Sender<DaemonEvent>,
}


impl DaemonHandle {
    /// Request daemon shutdown.
    pub fn shutdown(&self) -> Result<(), String> {
        self.sender
            .send(DaemonEvent::Shutdown)
            .map_err(|e| format!("Channel send failed: {}", e))
    }
}


pub struct Daemon {
    engine: Arc<Engine>,
    service: ServiceSocket,
    receiver: mpsc::Receiver<DaemonEvent>,
    handle: DaemonHandle,
    config: DaemonConfig,
    workers: Vec<JoinHandle<()>>,
}


impl Daemon {
    /// Bind the socket and create a fresh store populated with defaults.
    pub fn new(socket_path: &Path, config: DaemonConfig) -> Result<Daemon, ServiceError> {
        let engine = Engine::new(Arc::new(ConfigStore::new()));
        Self::with_engine(Arc::new(engine), socket_path, config)
    }

    /// Serve an existing engine, e.g. one whose store is shared with the
    /// surveillance loop.
    pub fn with_engine(
        engine: Arc<Engine>,
        socket_path: &Path,
        config: DaemonConfig,
    ) -> Result<Daemon, ServiceError> {
        let service = ServiceSocket::bind(socket_path)?;
        service.listener().set_nonblocking(true)?;
        let (sender, receiver) = mpsc::channel();
        Ok(Daemon {
            engine,
            service,
            receiver,
            handle: DaemonHandle { sender },
            config,
            workers: Vec::new(),
        })
    }

    /// Get a handle for stopping this daemon from another thread.
    pub fn handle(&self) -> DaemonHandle {
        self.handle.clone()
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Run the main loop. Blocks until shutdown is received, then waits for
    /// in-flight connections.
    pub fn run(&mut self) -> Result<(), ServiceError> {
        info!(socket = %self.service.path().display(), "survbot daemon started");
        while !self.tick() {}
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        info!("survbot daemon stopped");
        Ok(())
    }

    /// Run exactly one tick of the main loop.
    /// Returns true if shutdown was requested.
    pub fn tick(&mut self) -> bool {
        if self.drain_channel() {
            return true;
        }

        match self.service.listener().accept() {
            Ok((stream, _addr)) => self.spawn_worker(stream),
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(self.config.poll_interval_ms));
            }
            Err(e) => warn!(error = %e, "accept failed"),
        }

        self.workers.retain(|w| !w.is_finished());
        false
    }

    /// Drain all pending events from the channel.
    /// Returns true if a Shutdown event was received.
    fn drain_channel(&mut self) -> bool {
        loop {
            match self.receiver.try_recv() {
                Ok(DaemonEvent::Shutdown) => return true,
                Err(mpsc::TryRecvError::Empty) => return false,
                // The daemon keeps its own sender, so this cannot happen.
                Err(mpsc::TryRecvError::Disconnected) => return true,
            }
        }
    }

    fn spawn_worker(&mut self, stream: UnixStream) {
        let timeout = Duration::from_millis(self.config.request_timeout_ms);
        if let Err(e) = stream
            .set_nonblocking(false)
            .and_then(|_| stream.set_read_timeout(Some(timeout)))
        {
            warn!(error = %e, "cannot configure client stream");
            return;
        }

        let engine = Arc::clone(&self.engine);
        let handle = self.handle.clone();
        self.workers.push(thread::spawn(move || {
            match handle_connection(stream, &engine) {
                Ok(HandleResult::Dispatched) => {}
                Ok(HandleResult::Shutdown) => {
                    info!("stop requested over socket");
                    let _ = handle.shutdown();
                }
                Err(e) => warn!(error = %e, "connection failed"),
            }
        }));
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::client;
    use crate::command::{Command, Response};
    use crate::params::ParamName;
    use crate::types::protocol::Event;
    use crate::types::session::{MenuState, UserId};
    use crate::types::value::Value;

    /// Counter to generate unique short directory names per test.
    static TEST_SEQ: AtomicU32 = AtomicU32::new(0);

    /// Short socket path to stay under SUN_LEN.
    fn test_socket() -> PathBuf {
        let seq = TEST_SEQ.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!("svbd{}-{}.sock", std::process::id(), seq))
    }

    fn fast_config() -> DaemonConfig {
        DaemonConfig {
            poll_interval_ms: 5,
            request_timeout_ms: 2_000,
        }
    }

    #[test]
    fn daemon_new_creates_socket() {
        let path = test_socket();
        let daemon = Daemon::new(&path, fast_config()).unwrap();
        assert!(path.exists(), "Socket file should exist after Daemon::new");
        drop(daemon);
        assert!(!path.exists());
    }

    #[test]
    fn handle_shutdown_stops_tick() {
        let path = test_socket();
        let mut daemon = Daemon::new(&path, fast_config()).unwrap();
        assert!(!daemon.tick());
        daemon.handle().shutdown().unwrap();
        assert!(daemon.tick());
    }

    #[test]
    fn serves_conversation_then_stops() {
        let path = test_socket();
        let mut daemon = Daemon::new(&path, fast_config()).unwrap();
        let engine = Arc::clone(daemon.engine());
        let runner = thread::spawn(move || daemon.run());

        let timeout = Duration::from_secs(2);
        let send = |cmd: Command| client::send_command(&path, &cmd, timeout).unwrap();
        let event = |event: Event| send(Command::Event { event });
        let user = UserId(11);

        let steps = [
            Event::Start { user },
            Event::Press { user, token: "surveillance".into() },
            Event::Press { user, token: "edit:srv_video_duration".into() },
            Event::Text { user, text: "45".into() },
        ];
        let mut last = None;
        for step in steps {
            last = Some(event(step));
        }
        match last {
            Some(Response::Reply { reply }) => {
                assert_eq!(reply.state(), Some(MenuState::SurveillanceMenu))
            }
            other => panic!("unexpected response: {:?}", other),
        }
        assert_eq!(engine.store().get(ParamName::SrvVideoDuration), Ok(Value::Int(45)));

        assert_eq!(send(Command::DaemonStop), Response::Ok);
        runner.join().unwrap().unwrap();
        assert!(!path.exists());
    }
}
