//! Survbot core — the interactive configuration engine of the surveillance bot.
//!
//! | Module | Role |
//! |--------|------|
//! | `params` | Static registry of the eight tunable parameters |
//! | `store` | Thread-safe typed config store and defaults initializer |
//! | `validate` | Boolean, bounded integer and float input checks |
//! | `menu` | MarkdownV2 text and buttons for every screen |
//! | `engine` | Per-user conversation state machine |
//! | `command` | JSON command/response model served by the daemon |
//! | `service`, `daemon`, `client` | Unix socket transport |
//! | `settings` | `settings.yaml` loader |

pub mod client;
pub mod command;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod menu;
pub mod params;
pub mod service;
pub mod settings;
pub mod store;
pub mod types;
pub mod validate;
