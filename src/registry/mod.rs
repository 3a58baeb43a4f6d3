//! Command registry.
//!
//! The registry maps command names to [`Command`] descriptors. It is filled
//! during startup, usually by several independent registration groups, and is
//! only read once the console loop runs.
//!
//! Registering a name twice is rejected with [`Error::DuplicateName`]; the
//! command registered first stays in place.
//!
//! ```rust
//! use serial_console::dispatch::Context;
//! use serial_console::registry::{ArgSpec, Command, Error, Registry};
//! use serial_console::register_commands;
//!
//! fn reboot(_ctx: &mut Context<'_>) -> i32 {
//!     0
//! }
//!
//! fn uptime(_ctx: &mut Context<'_>) -> i32 {
//!     0
//! }
//!
//! const UPTIME_ARGS: &[ArgSpec] = &[ArgSpec::flag('s', "seconds only")];
//!
//! let mut registry = Registry::new();
//! register_commands!(
//!     registry,
//!     Command::new("reboot", "Restart the device", reboot),
//!     Command::new("uptime", "Show time since boot", uptime)
//!         .with_args(UPTIME_ARGS),
//! )
//! .unwrap();
//!
//! assert!(registry.resolve("reboot").is_some());
//! assert_eq!(
//!     registry.register(Command::new("reboot", "again", reboot)),
//!     Err(Error::DuplicateName)
//! );
//! ```

pub mod error;

pub use error::Error;

use crate::config::{MAX_COMMANDS, MAX_COMPLETIONS};
use crate::dispatch::Context;
use crate::editor::{Candidates, Completer, Hinter};
use core::fmt;
use heapless::FnvIndexMap;

/// Function signature for command handlers.
///
/// The handler receives the argument vector, an option scanner and the console
/// output through its [`Context`]. It returns `0` on success; any other value is
/// a failure the console reports with the code's symbolic name.
pub type CommandFn = fn(ctx: &mut Context<'_>) -> i32;

/// One entry of a command's argument specification.
///
/// Entries with a `short` character are options (`-x`, or `-x <value>` when
/// `value` is set); entries without one are positional operands. The
/// specification drives option scanning in handlers and the generated hint.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ArgSpec {
    /// Option character, `None` for operands.
    pub short: Option<char>,
    /// Name of the value the option takes, or of the operand.
    pub value: Option<&'static str>,
    /// Whether the entry must be present.
    pub required: bool,
    /// One-line description.
    pub help: &'static str,
}

impl ArgSpec {
    /// An optional flag without value.
    pub const fn flag(short: char, help: &'static str) -> Self {
        Self {
            short: Some(short),
            value: None,
            required: false,
            help,
        }
    }

    /// An optional option taking a value.
    pub const fn option(short: char, value: &'static str, help: &'static str) -> Self {
        Self {
            short: Some(short),
            value: Some(value),
            required: false,
            help,
        }
    }

    /// A required positional operand.
    pub const fn operand(value: &'static str, help: &'static str) -> Self {
        Self {
            short: None,
            value: Some(value),
            required: true,
            help,
        }
    }

    /// Mark this entry optional.
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Mark this entry required.
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Write the entry's syntax, e.g. `[-o <file>]` or `<path>`.
    pub fn write_syntax(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        if !self.required {
            out.write_char('[')?;
        }
        match (self.short, self.value) {
            (Some(short), Some(value)) => write!(out, "-{} <{}>", short, value)?,
            (Some(short), None) => write!(out, "-{}", short)?,
            (None, Some(value)) => write!(out, "<{}>", value)?,
            (None, None) => {}
        }
        if !self.required {
            out.write_char(']')?;
        }
        Ok(())
    }
}

/// A registered command.
#[derive(Clone, Copy)]
pub struct Command {
    /// Name the operator types. Case-sensitive, unique, without whitespace.
    pub name: &'static str,
    /// Description shown by `help`.
    pub help: &'static str,
    /// Inline hint shown after the name; generated from `args` when `None`.
    pub hint: Option<&'static str>,
    /// Argument specification.
    pub args: &'static [ArgSpec],
    /// Handler invoked on dispatch.
    pub handler: CommandFn,
}

impl Command {
    /// A command without hint or argument specification.
    pub const fn new(name: &'static str, help: &'static str, handler: CommandFn) -> Self {
        Self {
            name,
            help,
            hint: None,
            args: &[],
            handler,
        }
    }

    /// Set an explicit hint.
    pub const fn with_hint(mut self, hint: &'static str) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Set the argument specification.
    pub const fn with_args(mut self, args: &'static [ArgSpec]) -> Self {
        self.args = args;
        self
    }

    /// Whether the command has a hint to show.
    pub fn has_hint(&self) -> bool {
        self.hint.is_some() || !self.args.is_empty()
    }

    /// Write the hint: the explicit one, or the syntax of `args`.
    pub fn write_hint(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        if let Some(hint) = self.hint {
            return out.write_str(hint);
        }
        for (index, spec) in self.args.iter().enumerate() {
            if index > 0 {
                out.write_char(' ')?;
            }
            spec.write_syntax(out)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("help", &self.help)
            .field("hint", &self.hint)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// Name to command map.
///
/// Append-only: there is no removal, and a name can be registered once.
pub struct Registry {
    commands: FnvIndexMap<&'static str, Command, MAX_COMMANDS>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            commands: FnvIndexMap::new(),
        }
    }

    /// Register a command.
    ///
    /// # Errors
    ///
    /// * [`Error::EmptyName`] - the name is empty
    /// * [`Error::InvalidName`] - the name contains whitespace
    /// * [`Error::DuplicateName`] - the name is already taken; nothing changes
    /// * [`Error::RegistryFull`] - [`MAX_COMMANDS`] commands are registered
    pub fn register(&mut self, command: Command) -> Result<(), Error> {
        if command.name.is_empty() {
            return Err(Error::EmptyName);
        }
        if command.name.chars().any(char::is_whitespace) {
            return Err(Error::InvalidName);
        }
        if self.commands.contains_key(command.name) {
            return Err(Error::DuplicateName);
        }

        self.commands
            .insert(command.name, command)
            .map_err(|_| Error::RegistryFull)?;

        debug!("registered command {}", command.name);
        Ok(())
    }

    /// Register every command of a group, stopping at the first failure.
    pub fn register_all(&mut self, commands: &[Command]) -> Result<(), Error> {
        commands
            .iter()
            .try_for_each(|command| self.register(*command))
    }

    /// Look a command up by name.
    pub fn resolve(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no command is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    /// Commands sorted by name.
    pub fn sorted(&self) -> heapless::Vec<&Command, MAX_COMMANDS> {
        let mut commands: heapless::Vec<&Command, MAX_COMMANDS> = self.iter().collect();
        commands.sort_unstable_by_key(|command| command.name);
        commands
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.commands.keys())
            .finish()
    }
}

impl Completer for Registry {
    /// Complete command names while the first word is being typed.
    fn complete<'a>(&'a self, partial: &str, candidates: &mut Candidates<'a>) {
        let partial = partial.trim_start();
        if partial.chars().any(char::is_whitespace) {
            return;
        }
        for command in self.sorted() {
            if command.name.starts_with(partial) && candidates.len() < MAX_COMPLETIONS {
                let _ = candidates.push(command.name);
            }
        }
    }
}

impl Hinter for Registry {
    /// Hint a command's syntax once its full name has been typed.
    fn hint(&self, partial: &str, out: &mut dyn fmt::Write) -> bool {
        match self.resolve(partial) {
            Some(command) if command.has_hint() => {
                out.write_char(' ').is_ok() && command.write_hint(out).is_ok()
            }
            _ => false,
        }
    }
}

/// Register several commands at once.
///
/// Evaluates to the first registration error, or `Ok(())`. Works with anything
/// exposing a `register(Command) -> Result<(), Error>` method.
#[macro_export]
macro_rules! register_commands {
    ($registry:expr, $($command:expr),+ $(,)?) => {
        {
            let mut result = Ok(());
            $(
                if result.is_ok() {
                    result = $registry.register($command);
                }
            )+
            result
        }
    };
}
