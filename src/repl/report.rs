//! Console messages and dispatch result reporting.

use crate::dispatch::DispatchResult;
use crate::status;
use core::fmt;

/// Greeting printed when the console starts.
pub const BANNER: &str = "\n\
Type 'help' to get the list of commands.\n\
Use UP/DOWN arrows to navigate through command history.\n\
Press TAB when typing command name to auto-complete.\n";

/// Notice printed once when the terminal does not answer escape sequences.
pub const DUMB_NOTICE: &str = "\n\
Your terminal application does not support escape sequences.\n\n\
Line editing and history features are disabled.\n\n\
On Windows, try using Putty instead.\n";

/// Print the operator facing message for `result`.
///
/// Successful commands and empty lines print nothing.
pub fn report(result: &DispatchResult, out: &mut dyn fmt::Write) -> fmt::Result {
    match result {
        DispatchResult::Success | DispatchResult::EmptyInput => Ok(()),
        DispatchResult::CommandNotFound => out.write_str("Unrecognized command\n"),
        DispatchResult::HandlerFailure(code) => writeln!(
            out,
            "Command returned non-zero error code: 0x{:x} ({})",
            code,
            status::name(*code)
        ),
        DispatchResult::InternalError(error) => writeln!(out, "Internal error: {}", error.name()),
    }
}
