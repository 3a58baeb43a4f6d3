//! Line editing.
//!
//! A [`LineEditor`] turns the raw byte stream of a terminal into complete lines.
//! The REPL drives it through this trait only; [`BasicEditor`] is the bundled
//! implementation.
//!
//! Editors get their helpers through an [`Assist`]: the line history for
//! navigation, a [`Completer`] for TAB and a [`Hinter`] for inline hints. The
//! command [`Registry`](crate::registry::Registry) implements both of the latter.

pub mod basic;

pub use basic::BasicEditor;

use crate::config::MAX_COMPLETIONS;
use crate::history::{History, Line};
use crate::transport::{IoError, SerialIo};
use core::fmt;
use core::sync::atomic::AtomicBool;

/// How long [`LineEditor::probe`] waits for the terminal's status report.
pub const PROBE_TIMEOUT_MS: u32 = 500;

/// Pause between two probe polls that found no data.
pub const PROBE_POLL_INTERVAL_MS: u32 = 5;

/// Number of empty polls that make up [`PROBE_TIMEOUT_MS`].
pub const PROBE_POLLS: usize = (PROBE_TIMEOUT_MS / PROBE_POLL_INTERVAL_MS) as usize;

/// Device status request sent by the probe.
pub const STATUS_REQUEST: &str = "\x1b[5n";

/// Answer of a terminal in good condition.
pub const STATUS_OK: &[u8] = b"\x1b[0n";

/// Completion candidates offered for one TAB press.
pub type Candidates<'a> = heapless::Vec<&'a str, MAX_COMPLETIONS>;

/// Source of TAB completions.
pub trait Completer {
    /// Push the candidates completing `partial` into `candidates`.
    fn complete<'a>(&'a self, partial: &str, candidates: &mut Candidates<'a>);
}

/// Source of inline hints, shown after the cursor while typing.
pub trait Hinter {
    /// Write the hint for `partial` to `out`. Returns whether there is one.
    fn hint(&self, partial: &str, out: &mut dyn fmt::Write) -> bool;
}

/// Helpers available to the editor while reading a line.
#[derive(Clone, Copy)]
pub struct Assist<'a> {
    /// History to navigate with the arrow keys.
    pub history: Option<&'a History>,
    /// TAB completion source.
    pub completer: Option<&'a dyn Completer>,
    /// Inline hint source.
    pub hinter: Option<&'a dyn Hinter>,
    /// SGR color code of hints.
    pub hint_color: u8,
    /// Whether hints are drawn bold.
    pub hint_bold: bool,
}

impl Assist<'_> {
    /// No history, completion or hints.
    pub const fn none() -> Self {
        Self {
            history: None,
            completer: None,
            hinter: None,
            hint_color: 90,
            hint_bold: false,
        }
    }
}

impl Default for Assist<'_> {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Assist<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assist")
            .field("history", &self.history.map(History::len))
            .field("completer", &self.completer.is_some())
            .field("hinter", &self.hinter.is_some())
            .field("hint_color", &self.hint_color)
            .field("hint_bold", &self.hint_bold)
            .finish()
    }
}

/// How a call to [`LineEditor::read_line`] ended.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ReadOutcome {
    /// A line was entered.
    Line,
    /// The line was abandoned, e.g. with Ctrl-C. Nothing to dispatch.
    Empty,
    /// The cancellation flag was raised while waiting.
    Cancelled,
}

/// Terminal line editing session.
pub trait LineEditor {
    /// Ask the terminal for a status report.
    ///
    /// Returns `true` if it answered within [`PROBE_TIMEOUT_MS`], meaning escape
    /// sequences are understood. The wait is measured with
    /// [`SerialIo::delay_ms`], so it does not depend on how fast the port polls.
    fn probe<S: SerialIo + ?Sized>(&mut self, io: &mut S) -> Result<bool, IoError>;

    /// Switch plain echo mode on or off.
    fn set_dumb_mode(&mut self, dumb: bool);

    /// Whether plain echo mode is on.
    fn is_dumb_mode(&self) -> bool;

    /// Limit the length of entered lines.
    fn set_max_line_len(&mut self, len: usize);

    /// Allow lines to wrap over several terminal rows.
    fn set_multiline(&mut self, multiline: bool);

    /// Whether lines may wrap over several terminal rows.
    fn is_multiline(&self) -> bool;

    /// Read one line into `line`, showing `prompt` first.
    ///
    /// `cancel` is checked between polls; once it is set the call returns
    /// [`ReadOutcome::Cancelled`].
    fn read_line<'a, S: SerialIo + ?Sized>(
        &mut self,
        io: &mut S,
        prompt: &str,
        assist: &Assist<'a>,
        cancel: &AtomicBool,
        line: &mut Line,
    ) -> Result<ReadOutcome, IoError>;
}
