//! Client — one-shot requests to a running survbot daemon.
//!
//! Each call opens a fresh connection, writes one command frame and reads
//! one response frame. The daemon must already be running; there is no
//! auto-start.

use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::command::{Command, Response};
use crate::error::ServiceError;
use crate::service::{read_frame, write_frame};


/// Send a command to the daemon socket and wait up to `timeout` for the
/// response.
pub fn send_command(
    socket: &Path,
    cmd: &Command,
    timeout: Duration,
) -> Result<Response, ServiceError> {
    let mut stream = UnixStream::connect(socket).map_err(|source| ServiceError::Connect {
        path: socket.to_path_buf(),
        source,
    })?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    debug!(socket = %socket.display(), ?cmd, "sending command");
    write_frame(&mut stream, cmd)?;
    read_frame(&mut stream)
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
