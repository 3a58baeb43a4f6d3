//! # serial-console - interactive command console for embedded devices
//!
//! An operator attaches a terminal to a UART, types a line, and the console
//! resolves the first word to a registered command, runs it, and reports how it
//! went. The crate is `no_std` and allocation free: every buffer is sized at
//! compile time (see [`config`]).
//!
//! ## Features
//!
//! - **Command registry**: named handlers with help text, hints and argument
//!   specifications, registered by independent groups at startup
//! - **Dispatch**: whitespace/quote aware tokenizing, `getopt`-style option
//!   scanning that starts fresh for every command, esp-style status reporting
//! - **Line editing**: VT100 editing keys, history navigation, TAB completion
//!   and inline hints, with a plain echo fallback for dumb terminals
//! - **History**: bounded, with persistence through a pluggable store
//! - **Session**: console variables and the multi-line switch, changed by
//!   commands while the console runs
//! - **Serial transport**: ordered UART bring-up behind a driver trait, with
//!   line ending translation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core::sync::atomic::AtomicBool;
//! use serial_console::config::SessionConfig;
//! use serial_console::dispatch::Context;
//! use serial_console::editor::BasicEditor;
//! use serial_console::history::MemoryStore;
//! use serial_console::registry::Command;
//! use serial_console::repl::{Console, RootDir};
//! use serial_console::transport::{self, SerialDriver};
//!
//! fn reboot(ctx: &mut Context<'_>) -> i32 {
//!     let _ = ctx.out().write_str("rebooting\n");
//!     0
//! }
//!
//! fn start<D: SerialDriver>(driver: D) -> Result<(), serial_console::ConfigurationError> {
//!     let config = SessionConfig::default()
//!         .with_channel(1)
//!         .with_prompt("%pwd%> ")
//!         .with_history_path("/spiffs/history.txt");
//!
//!     let mut console = Console::new(&config)?;
//!     console.register_core_commands().ok();
//!     console.register(Command::new("reboot", "Restart the device", reboot)).ok();
//!
//!     let port = transport::configure(driver, &config)?;
//!     let store: MemoryStore<2048> = MemoryStore::new();
//!     let mut repl = console.begin(port, BasicEditor::new(), store, RootDir);
//!     let _ = repl.run(&AtomicBool::new(false));
//!     Ok(())
//! }
//! ```
//!
//! ## Optional Features
//!
//! - `std`: filesystem history store, host working directory and a threaded
//!   console (`Repl::spawn`)
//! - `defmt`: log through `defmt`
//! - `log`: log through the `log` facade

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

#[macro_use]
mod fmt;

pub mod args;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod editor;
pub mod history;
pub mod registry;
pub mod repl;
pub mod session;
pub mod status;
pub mod transport;

pub use config::{ConfigurationError, SessionConfig};
pub use dispatch::{Context, DispatchResult, Dispatcher};
pub use registry::{ArgSpec, Command, CommandFn, Registry};
pub use repl::{Console, Repl};
pub use session::Session;
