//! Line dispatch.
//!
//! The [`Dispatcher`] turns one raw line into one [`DispatchResult`]:
//!
//! 1. split the line into arguments ([`ArgBuffer`])
//! 2. resolve `argv[0]` in the [`Registry`]
//! 3. run the handler with a fresh [`Context`]
//! 4. map the handler status (zero is success)
//!
//! The argument scanner lives in the `Context` built for each call, so the next
//! command always starts scanning from its first argument.

use crate::args::{ArgBuffer, Args, Opt, OptError, SplitError};
use crate::config::MAX_LINE_LENGTH;
use crate::history::History;
use crate::registry::{Command, Registry};
use crate::session::Session;
use crate::status;
use core::fmt;

/// Failures of the dispatch machinery itself, as opposed to handler failures.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InternalError {
    /// The line is longer than the configured maximum.
    LineTooLong,
    /// The line splits into more arguments than the configured maximum.
    TooManyArguments,
}

impl InternalError {
    /// Symbolic name used when reporting.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LineTooLong => "LINE_TOO_LONG",
            Self::TooManyArguments => "TOO_MANY_ARGUMENTS",
        }
    }
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for InternalError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            InternalError::LineTooLong => defmt::write!(f, "LineTooLong"),
            InternalError::TooManyArguments => defmt::write!(f, "TooManyArguments"),
        }
    }
}

impl From<SplitError> for InternalError {
    fn from(error: SplitError) -> Self {
        match error {
            SplitError::LineTooLong => Self::LineTooLong,
            SplitError::TooManyArguments => Self::TooManyArguments,
        }
    }
}

/// Outcome of dispatching one line.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DispatchResult {
    /// The handler ran and returned zero.
    Success,
    /// No command is registered under the first token.
    CommandNotFound,
    /// The line holds no token.
    EmptyInput,
    /// The handler ran and returned this non-zero status.
    HandlerFailure(i32),
    /// The handler could not be invoked.
    InternalError(InternalError),
}

impl DispatchResult {
    /// Whether the command ran and succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DispatchResult {
    fn format(&self, f: defmt::Formatter) {
        match self {
            DispatchResult::Success => defmt::write!(f, "Success"),
            DispatchResult::CommandNotFound => defmt::write!(f, "CommandNotFound"),
            DispatchResult::EmptyInput => defmt::write!(f, "EmptyInput"),
            DispatchResult::HandlerFailure(code) => defmt::write!(f, "HandlerFailure({})", code),
            DispatchResult::InternalError(error) => defmt::write!(f, "InternalError({})", error),
        }
    }
}

/// Everything a handler can see while it runs.
///
/// `Context` implements [`fmt::Write`], so handlers print with `write!` and
/// `writeln!` directly.
pub struct Context<'a> {
    /// Argument vector and option scanner, positioned after the command name.
    pub args: Args<'a>,
    command: &'a Command,
    out: &'a mut dyn fmt::Write,
    registry: &'a Registry,
    history: Option<&'a History>,
    session: Option<&'a Session>,
}

impl<'a> Context<'a> {
    /// Number of arguments, the command name included.
    pub fn argc(&self) -> usize {
        self.args.argc()
    }

    /// The full argument vector.
    pub fn argv(&self) -> &'a [&'a str] {
        self.args.argv()
    }

    /// The command being run.
    pub fn command(&self) -> &'a Command {
        self.command
    }

    /// Scan the next option against the command's argument specification.
    pub fn next_opt(&mut self) -> Option<Result<Opt<'a>, OptError>> {
        self.args.next_opt(self.command.args)
    }

    /// The console output.
    pub fn out(&mut self) -> &mut dyn fmt::Write {
        &mut *self.out
    }

    /// The registry the command was resolved in.
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// The console's line history, when the caller provided one.
    pub fn history(&self) -> Option<&'a History> {
        self.history
    }

    /// The console's mutable settings, when the line came from a console.
    pub fn session(&self) -> Option<&'a Session> {
        self.session
    }
}

impl fmt::Write for Context<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.out.write_str(s)
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("args", &self.args)
            .field("command", &self.command.name)
            .finish_non_exhaustive()
    }
}

/// Resolves lines against a registry and runs their handlers.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'r> {
    registry: &'r Registry,
    session: Option<&'r Session>,
    max_args: usize,
    max_line_length: usize,
}

impl<'r> Dispatcher<'r> {
    /// A dispatcher with the given argument and line length limits.
    pub fn new(registry: &'r Registry, max_args: usize, max_line_length: usize) -> Self {
        Self {
            registry,
            session: None,
            max_args,
            max_line_length: max_line_length.min(MAX_LINE_LENGTH),
        }
    }

    /// Lend `session` to the handlers run by this dispatcher.
    pub fn with_session(mut self, session: &'r Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Dispatch one raw line.
    ///
    /// Handler output goes to `out`. `history` is made available to handlers
    /// through [`Context::history`].
    pub fn dispatch(
        &self,
        line: &str,
        out: &mut dyn fmt::Write,
        history: Option<&History>,
    ) -> DispatchResult {
        if line.len() > self.max_line_length {
            return DispatchResult::InternalError(InternalError::LineTooLong);
        }

        let buffer = match ArgBuffer::split(line, self.max_args) {
            Ok(buffer) => buffer,
            Err(error) => return DispatchResult::InternalError(error.into()),
        };
        if buffer.argc() == 0 {
            return DispatchResult::EmptyInput;
        }

        let argv = buffer.argv();
        let Some(command) = self.registry.resolve(argv[0]) else {
            return DispatchResult::CommandNotFound;
        };

        let mut ctx = Context {
            args: Args::new(&argv),
            command,
            out,
            registry: self.registry,
            history,
            session: self.session,
        };
        let code = (command.handler)(&mut ctx);

        if code == status::OK {
            DispatchResult::Success
        } else {
            DispatchResult::HandlerFailure(code)
        }
    }
}
