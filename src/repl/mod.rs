//! The interactive console loop.
//!
//! A console goes through two phases. While it is a [`Console`], commands can be
//! registered. [`Console::begin`] then moves the registry into a [`Repl`], which
//! only reads it. The loop itself cycles through these phases:
//!
//! ```text
//!            ┌──────────────────────────────────────────┐
//!            ▼                                          │
//! Idle ─▶ AwaitingLine ─▶ Dispatching ─▶ Reporting ─────┘
//!            │
//!            └─▶ Stopped   (cancelled, or transport failure)
//! ```
//!
//! # Example
//!
//! ```rust
//! use core::sync::atomic::AtomicBool;
//! use serial_console::config::SessionConfig;
//! use serial_console::editor::BasicEditor;
//! use serial_console::history::NoHistory;
//! use serial_console::repl::{Console, RootDir};
//! use serial_console::transport::{IoError, SerialIo};
//!
//! /// Terminal that answers the probe, types `echo hi` and hangs up.
//! struct Scripted(&'static [u8], usize);
//!
//! impl SerialIo for Scripted {
//!     fn read_byte(&mut self) -> Result<Option<u8>, IoError> {
//!         let byte = self.0.get(self.1).copied().ok_or(IoError::Closed)?;
//!         self.1 += 1;
//!         Ok(Some(byte))
//!     }
//!     fn write_all(&mut self, _bytes: &[u8]) -> Result<(), IoError> {
//!         Ok(())
//!     }
//!     fn flush(&mut self) -> Result<(), IoError> {
//!         Ok(())
//!     }
//!     fn delay_ms(&mut self, _ms: u32) {}
//! }
//!
//! let mut console = Console::new(&SessionConfig::default()).unwrap();
//! console.register_core_commands().unwrap();
//!
//! let io = Scripted(b"\x1b[0necho hi\n", 0);
//! let mut repl = console.begin(io, BasicEditor::new(), NoHistory, RootDir);
//! let cancel = AtomicBool::new(false);
//!
//! assert_eq!(repl.run(&cancel), Err(IoError::Closed));
//! assert_eq!(repl.history().newest(), Some("echo hi"));
//! ```

pub mod prompt;
pub mod report;

pub use prompt::{RenderedPrompt, RootDir, WorkingDirectory};
#[cfg(feature = "std")]
pub use prompt::StdWorkingDir;

use crate::commands;
use crate::config::{
    ConfigurationError, MAX_PATH_LEN, MAX_PROMPT_LEN, SessionConfig,
};
use crate::dispatch::{DispatchResult, Dispatcher};
use crate::editor::{Assist, LineEditor, ReadOutcome};
use crate::history::{History, HistoryStore, Line};
use crate::registry::{self, Command, Registry};
use crate::session::Session;
use crate::transport::{IoError, IoWriter, SerialIo};
use core::sync::atomic::{AtomicBool, Ordering};

/// Name of the thread started by `Repl::spawn`.
pub const TASK_NAME: &str = "console_repl";

/// Where the loop currently is.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Phase {
    /// Not started yet.
    Idle,
    /// Waiting for the operator to enter a line.
    AwaitingLine,
    /// Running a command handler.
    Dispatching,
    /// Printing the outcome of a command.
    Reporting,
    /// The loop has ended.
    Stopped,
}

/// Observable state of a running console.
#[derive(Debug, Clone)]
pub struct ReplState {
    /// Current phase.
    pub phase: Phase,
    /// Prompt template, rendered again before every line.
    pub prompt: heapless::String<MAX_PROMPT_LEN>,
    /// Outcome of the last dispatched line.
    pub last_result: Option<DispatchResult>,
    /// File the history is persisted to, if any.
    pub history_path: Option<heapless::String<MAX_PATH_LEN>>,
    /// Number of lines dispatched so far.
    pub dispatched: u32,
}

/// Runtime limits copied out of the [`SessionConfig`].
#[derive(Debug, Clone)]
struct Settings {
    max_line_length: usize,
    max_args: usize,
    max_history_len: usize,
    hint_color: u8,
    hint_bold: bool,
    multiline: bool,
    #[cfg_attr(not(feature = "std"), allow(dead_code))]
    task_stack_size: usize,
}

/// A console being set up: commands can still be registered.
#[derive(Debug)]
pub struct Console {
    settings: Settings,
    prompt: heapless::String<MAX_PROMPT_LEN>,
    history_path: Option<heapless::String<MAX_PATH_LEN>>,
    registry: Registry,
}

impl Console {
    /// Validate `config` and create a console with an empty registry.
    pub fn new(config: &SessionConfig<'_>) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let prompt = heapless::String::try_from(config.prompt)
            .map_err(|_| ConfigurationError::PromptTooLong)?;
        let history_path = config
            .history_path
            .map(heapless::String::try_from)
            .transpose()
            .map_err(|_| ConfigurationError::HistoryPathTooLong)?;

        Ok(Self {
            settings: Settings {
                max_line_length: config.max_line_length,
                max_args: config.max_args,
                max_history_len: config.max_history_len,
                hint_color: config.hint_color,
                hint_bold: config.hint_bold,
                multiline: config.multiline,
                task_stack_size: config.task_stack_size,
            },
            prompt,
            history_path,
            registry: Registry::new(),
        })
    }

    /// Register a command.
    pub fn register(&mut self, command: Command) -> Result<(), registry::Error> {
        self.registry.register(command)
    }

    /// Register a group of commands, stopping at the first failure.
    pub fn register_all(&mut self, commands: &[Command]) -> Result<(), registry::Error> {
        self.registry.register_all(commands)
    }

    /// Register the built-in commands of [`commands::CORE`].
    pub fn register_core_commands(&mut self) -> Result<(), registry::Error> {
        commands::register(&mut self.registry)
    }

    /// The commands registered so far.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Finish setup and bind the console to its terminal.
    ///
    /// Loads the history file when one is configured. A missing or unreadable
    /// file only means the console starts without history.
    pub fn begin<S, E, H, W>(self, io: S, mut editor: E, mut store: H, cwd: W) -> Repl<S, E, H, W>
    where
        S: SerialIo,
        E: LineEditor,
        H: HistoryStore,
        W: WorkingDirectory,
    {
        let mut history = History::with_max_len(self.settings.max_history_len);
        if let Some(path) = &self.history_path {
            match history.load(&mut store, path) {
                Ok(count) => debug!("loaded {} history entries from {}", count, path.as_str()),
                Err(_) => debug!("no history loaded from {}", path.as_str()),
            }
        }

        editor.set_max_line_len(self.settings.max_line_length);
        editor.set_multiline(self.settings.multiline);

        info!("console initialized with {} commands", self.registry.len());
        Repl {
            io,
            editor,
            store,
            cwd,
            registry: self.registry,
            history,
            session: Session::new(self.settings.multiline),
            settings: self.settings,
            state: ReplState {
                phase: Phase::Idle,
                prompt: self.prompt,
                last_result: None,
                history_path: self.history_path,
                dispatched: 0,
            },
            started: false,
        }
    }
}

/// A running console bound to its terminal.
#[derive(Debug)]
pub struct Repl<S, E, H, W> {
    io: S,
    editor: E,
    store: H,
    cwd: W,
    registry: Registry,
    history: History,
    session: Session,
    settings: Settings,
    state: ReplState,
    started: bool,
}

impl<S, E, H, W> Repl<S, E, H, W>
where
    S: SerialIo,
    E: LineEditor,
    H: HistoryStore,
    W: WorkingDirectory,
{
    /// Current state.
    pub fn state(&self) -> &ReplState {
        &self.state
    }

    /// Settings commands can change at runtime.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The command registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The line history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The terminal.
    pub fn io(&self) -> &S {
        &self.io
    }

    /// The terminal, mutably.
    pub fn io_mut(&mut self) -> &mut S {
        &mut self.io
    }

    /// The line editor.
    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// The history store.
    pub fn store(&self) -> &H {
        &self.store
    }

    /// Run the loop until `cancel` is raised.
    ///
    /// The greeting and the terminal probe happen on the first call only.
    /// Returns `Ok(())` once cancelled, or the transport error that stopped the
    /// loop.
    pub fn run(&mut self, cancel: &AtomicBool) -> Result<(), IoError> {
        let result = self.run_loop(cancel);
        self.state.phase = Phase::Stopped;
        match result {
            Ok(()) => info!("console loop ended"),
            Err(error) => error!("console loop stopped: {:?}", error),
        }
        result
    }

    fn run_loop(&mut self, cancel: &AtomicBool) -> Result<(), IoError> {
        self.start()?;

        loop {
            self.state.phase = Phase::AwaitingLine;
            if cancel.load(Ordering::Acquire) {
                return Ok(());
            }

            let prompt = prompt::render(&self.state.prompt, &self.cwd);
            self.editor.set_multiline(self.session.multiline());
            let assist = Assist {
                history: Some(&self.history),
                completer: Some(&self.registry),
                hinter: Some(&self.registry),
                hint_color: self.settings.hint_color,
                hint_bold: self.settings.hint_bold,
            };
            let mut line = Line::new();
            match self
                .editor
                .read_line(&mut self.io, &prompt, &assist, cancel, &mut line)?
            {
                ReadOutcome::Line => {}
                ReadOutcome::Empty => continue,
                ReadOutcome::Cancelled => return Ok(()),
            }

            self.execute(&line)?;
        }
    }

    fn start(&mut self) -> Result<(), IoError> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        self.io.write_str(report::BANNER)?;
        if !self.editor.probe(&mut self.io)? {
            info!("terminal did not answer the status request, using dumb mode");
            self.editor.set_dumb_mode(true);
        }
        if self.editor.is_dumb_mode() {
            self.io.write_str(report::DUMB_NOTICE)?;
        }
        Ok(())
    }

    /// Record, dispatch and report one line as if the operator had entered it.
    pub fn execute(&mut self, line: &str) -> Result<DispatchResult, IoError> {
        debug!("line: {}", line);
        if self.history.push(line) {
            if let Some(path) = &self.state.history_path {
                if self.history.save(&mut self.store, path).is_err() {
                    warn!("saving history to {} failed", path.as_str());
                }
            }
        }

        self.state.phase = Phase::Dispatching;
        let dispatcher = Dispatcher::new(
            &self.registry,
            self.settings.max_args,
            self.settings.max_line_length,
        )
        .with_session(&self.session);
        let mut out = IoWriter::new(&mut self.io);
        let result = dispatcher.dispatch(line, &mut out, Some(&self.history));
        if let Some(error) = out.take_error() {
            return Err(error);
        }

        self.state.phase = Phase::Reporting;
        let _ = report::report(&result, &mut out);
        if let Some(error) = out.take_error() {
            return Err(error);
        }

        self.state.last_result = Some(result);
        self.state.dispatched = self.state.dispatched.wrapping_add(1);
        Ok(result)
    }
}

#[cfg(feature = "std")]
mod thread;

#[cfg(feature = "std")]
pub use thread::ReplHandle;
