use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::command::{self, Command, Response};
use crate::engine::Engine;
use crate::error::ServiceError;


/// Largest accepted frame payload.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;


/// Unix domain socket listener. Each connection carries one length-prefixed
/// JSON `Command` and receives one length-prefixed JSON `Response`.
pub struct ServiceSocket {
    listener: UnixListener,
    path: PathBuf,
}


/// Result of handling a single connection.
#[derive(Debug, PartialEq)]
pub enum HandleResult {
    /// A regular command was executed against the engine.
    Dispatched,
    /// A DaemonStop command was received; the daemon should shut down.
    Shutdown,
}


impl ServiceSocket {
    /// Bind a new Unix domain socket at the given path.
    /// Removes any stale socket file first.
    pub fn bind(path: &Path) -> Result<ServiceSocket, ServiceError> {
        if path.exists() {
            std::fs::remove_file(path).map_err(|source| ServiceError::Bind {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let listener = UnixListener::bind(path).map_err(|source| ServiceError::Bind {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(ServiceSocket {
            listener,
            path: path.to_path_buf(),
        })
    }

    pub fn listener(&self) -> &UnixListener {
        &self.listener
    }

    /// Return the path this socket is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the socket file from disk (static helper).
    pub fn cleanup(path: &Path) {
        let _ = std::fs::remove_file(path);
    }
}

impl Drop for ServiceSocket {
    fn drop(&mut self) {
        ServiceSocket::cleanup(&self.path);
    }
}


/// Handle a single connection: read one command, execute it, write the
/// response back.
pub fn handle_connection(
    mut stream: UnixStream,
    engine: &Engine,
) -> Result<HandleResult, ServiceError> {
    let cmd: Command = read_frame(&mut stream)?;
    debug!(?cmd, "command received");

    if cmd == Command::DaemonStop {
        write_frame(&mut stream, &Response::Ok)?;
        return Ok(HandleResult::Shutdown);
    }

    let response = command::execute(engine, cmd);
    if let Response::Error { message } = &response {
        warn!(%message, "command failed");
    }
    write_frame(&mut stream, &response)?;
    Ok(HandleResult::Dispatched)
}


/// Read a length-prefixed JSON frame from a stream.
///
/// Wire format: 4 bytes big-endian length, then that many bytes of JSON.
pub fn read_frame<T: DeserializeOwned>(stream: &mut impl Read) -> Result<T, ServiceError> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;

    if len == 0 {
        return Err(ServiceError::EmptyFrame);
    }
    if len > MAX_FRAME_LEN {
        return Err(ServiceError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload)?;
    Ok(serde_json::from_slice(&payload)?)
}


/// Write a length-prefixed JSON frame to a stream.
pub fn write_frame<T: Serialize>(stream: &mut impl Write, value: &T) -> Result<(), ServiceError> {
    let json = serde_json::to_vec(value)?;
    if json.len() > MAX_FRAME_LEN {
        return Err(ServiceError::FrameTooLarge(json.len()));
    }
    let len = json.len() as u32;
    stream.write_all(&len.to_be_bytes())?;
    stream.write_all(&json)?;
    stream.flush()?;
    Ok(())
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
