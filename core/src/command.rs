//! Command — the typed interface for all survbot daemon operations.
//!
//! Every request a client can send over the daemon socket is a variant of
//! `Command`; every answer is a `Response`. Both are the JSON wire format.
//!
//! # Wire Format
//!
//! Commands are serialized as JSON objects with a `"command"` discriminant:
//!
//! ```json
//! {"command": "event", "event": {"event": "start", "user": 42}}
//! {"command": "event", "event": {"event": "press", "user": 42, "token": "general"}}
//! {"command": "config.get", "name": "srv_video_threshold"}
//! {"command": "daemon.stop"}
//! ```
//!
//! | Group | Commands |
//! |-------|----------|
//! | Conversation | `event` |
//! | Config store (read-only) | `config.get`, `config.show` |
//! | Daemon | `daemon.stop` |

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::engine::Engine;
use crate::params::{self, ParamName};
use crate::types::protocol::{Event, Reply};
use crate::types::value::Value;


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command")]
pub enum Command {
    /// Feed one chat event to the conversation engine.
    #[serde(rename = "event")]
    Event { event: Event },

    /// Read one config value by wire name.
    #[serde(rename = "config.get")]
    ConfigGet { name: String },

    /// Read every config value.
    #[serde(rename = "config.show")]
    ConfigShow,

    /// Stop the daemon after answering.
    #[serde(rename = "daemon.stop")]
    DaemonStop,
}


/// One store entry as reported to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    pub name: ParamName,
    pub value: Value,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Reply { reply: Reply },
    Values { values: Vec<Entry> },
    Ok,
    Error { message: String },
}


/// Execute a command against the engine. `DaemonStop` only acknowledges;
/// stopping the loop is the caller's job.
pub fn execute(engine: &Engine, cmd: Command) -> Response {
    match cmd {
        Command::Event { event } => match engine.handle(event) {
            Ok(reply) => Response::Reply { reply },
            Err(e) => {
                error!(error = %e, "engine fault");
                Response::Error {
                    message: e.to_string(),
                }
            }
        },
        Command::ConfigGet { name } => match lookup(engine, &name) {
            Ok(entry) => Response::Values {
                values: vec![entry],
            },
            Err(message) => Response::Error { message },
        },
        Command::ConfigShow => Response::Values {
            values: engine
                .store()
                .snapshot()
                .entries()
                .into_iter()
                .map(|(name, value)| Entry { name, value })
                .collect(),
        },
        Command::DaemonStop => Response::Ok,
    }
}


fn lookup(engine: &Engine, name: &str) -> Result<Entry, String> {
    let param = params::describe(name).map_err(|e| e.to_string())?;
    let value = engine.store().get(param.name).map_err(|e| e.to_string())?;
    Ok(Entry {
        name: param.name,
        value,
    })
}
