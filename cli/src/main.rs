//! survbot CLI — runs the configuration daemon and talks to it.
//!
//! # Usage
//!
//! ```text
//! survbot daemon
//! survbot start --user 42
//! survbot press --user 42 surveillance
//! survbot press --user 42 edit:srv_audio_threshold
//! survbot text --user 42 0.2
//! survbot get srv_audio_threshold
//! survbot show
//! survbot stop
//! survbot chat
//! ```

mod chat;
mod cli;
mod display;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use survbot_core::client;
use survbot_core::daemon::Daemon;
use survbot_core::engine::Engine;
use survbot_core::settings::{self, Settings};
use survbot_core::store::ConfigStore;
use survbot_core::types::session::UserId;

use cli::{Cli, Commands};


fn main() {
    let cli = Cli::parse();
    let config_dir = cli.config_dir.clone().unwrap_or_else(resolve_config_dir);

    let settings = match settings::load_from_dir(&config_dir) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("survbot: {}", e);
            process::exit(1);
        }
    };
    init_tracing(&settings.log_filter);

    let socket = cli
        .socket
        .clone()
        .unwrap_or_else(|| settings.socket_path(&config_dir));

    if let Err(message) = run(&cli.command, &settings, &socket) {
        eprintln!("survbot: {}", message);
        process::exit(1);
    }
}


fn run(command: &Commands, settings: &Settings, socket: &Path) -> Result<(), String> {
    match command {
        Commands::Daemon => run_daemon(settings, socket),
        Commands::Chat { user } => {
            let engine = Engine::new(Arc::new(ConfigStore::new()));
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            chat::run(&engine, UserId(*user), stdin.lock(), &mut stdout).map_err(|e| e.to_string())
        }
        remote => {
            let Some(cmd) = remote.to_command() else {
                return Err(format!("{:?} cannot be sent to the daemon", remote));
            };
            let resp = client::send_command(socket, &cmd, settings.request_timeout())
                .map_err(|e| format!("daemon unavailable ({})", e))?;
            let output = display::response(&resp)?;
            if !output.is_empty() {
                println!("{}", output);
            }
            Ok(())
        }
    }
}


fn run_daemon(settings: &Settings, socket: &Path) -> Result<(), String> {
    if let Some(parent) = socket.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create {}: {}", parent.display(), e))?;
    }
    let mut daemon = Daemon::new(socket, settings.daemon_config())
        .map_err(|e| format!("daemon failed to start: {}", e))?;
    info!(pid = process::id(), "daemon process running");
    daemon.run().map_err(|e| e.to_string())
}


fn resolve_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SURVBOT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".config").join("survbot")
}


/// Log to stderr; `RUST_LOG` wins over the settings filter.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}


#[cfg(test)]
mod tests {
    use super::*;

    // One test: both cases mutate the same process-wide variable.
    #[test]
    fn resolve_config_dir_default_and_env() {
        let old = std::env::var("SURVBOT_CONFIG_DIR").ok();

        std::env::remove_var("SURVBOT_CONFIG_DIR");
        let dir = resolve_config_dir();
        assert!(dir.to_string_lossy().contains(".config/survbot"));

        std::env::set_var("SURVBOT_CONFIG_DIR", "/tmp/test-survbot-config");
        assert_eq!(resolve_config_dir(), PathBuf::from("/tmp/test-survbot-config"));

        match old {
            Some(v) => std::env::set_var("SURVBOT_CONFIG_DIR", v),
            None => std::env::remove_var("SURVBOT_CONFIG_DIR"),
        }
    }

    #[test]
    fn remote_command_without_daemon_fails() {
        let socket = std::env::temp_dir().join(format!("svbm{}.sock", process::id()));
        let settings = Settings::default();
        let err = run(&Commands::Show, &settings, &socket).unwrap_err();
        assert!(err.starts_with("daemon unavailable"));
    }

    #[test]
    fn remote_round_trip_through_daemon() {
        let socket = std::env::temp_dir().join(format!("svbm{}-rt.sock", process::id()));
        let settings = Settings {
            poll_interval_ms: 5,
            ..Settings::default()
        };
        let mut daemon = Daemon::new(&socket, settings.daemon_config()).unwrap();
        let handle = daemon.handle();
        let thread = std::thread::spawn(move || daemon.run().unwrap());

        run(&Commands::Start { user: 3 }, &settings, &socket).unwrap();
        run(&Commands::Get { name: "timestamp".into() }, &settings, &socket).unwrap();
        let err = run(&Commands::Get { name: "zoom".into() }, &settings, &socket).unwrap_err();
        assert_eq!(err, "unknown parameter: zoom");

        handle.shutdown().unwrap();
        thread.join().unwrap();
    }
}
