//! Built-in console commands.
//!
//! | Command              | Description                                   |
//! |----------------------|-----------------------------------------------|
//! | `help [<command>]`   | list every command, or describe one           |
//! | `history`            | print the line history, oldest first          |
//! | `echo [-n] [<text>]` | print the operands separated by spaces        |
//! | `clear`              | clear the terminal                            |
//! | `multiline [on\|off]`| show or switch multi-line editing             |
//! | `env`                | list the console variables                    |
//! | `declare <name> <value>` | set a console variable                    |
//!
//! `multiline`, `env` and `declare` work on the console's
//! [`Session`](crate::session::Session) and fail with `NOT_SUPPORTED` when
//! dispatched without one.
//!
//! Register them with [`register`] or through
//! [`Console::register_core_commands`](crate::repl::Console::register_core_commands).

use crate::dispatch::Context;
use crate::registry::{ArgSpec, Command, Error, Registry};
use crate::session::{VarValue, VariableError};
use crate::status;
use core::fmt::{self, Write};

const HELP_ARGS: &[ArgSpec] = &[ArgSpec::operand("command", "Name of the command to describe").optional()];

const ECHO_ARGS: &[ArgSpec] = &[
    ArgSpec::flag('n', "Do not print the trailing newline"),
    ArgSpec::operand("text", "Text to print").optional(),
];

const MULTILINE_ARGS: &[ArgSpec] = &[ArgSpec::operand("on|off", "New setting; prints the current one when omitted").optional()];

const DECLARE_ARGS: &[ArgSpec] = &[
    ArgSpec::operand("name", "Variable name"),
    ArgSpec::operand("value", "Value; further words are joined with spaces"),
];

/// `help [<command>]`
pub const HELP: Command = Command::new(
    "help",
    "Print the list of registered commands, or the description of one command",
    help,
)
.with_args(HELP_ARGS);

/// `history`
pub const HISTORY: Command = Command::new("history", "Print the command history, oldest first", history);

/// `echo [-n] [<text>]`
pub const ECHO: Command = Command::new("echo", "Print the arguments separated by spaces", echo).with_args(ECHO_ARGS);

/// `clear`
pub const CLEAR: Command = Command::new("clear", "Clear the terminal screen", clear);

/// `multiline [on|off]`
pub const MULTILINE: Command = Command::new(
    "multiline",
    "Show or switch editing of lines wrapping over several rows",
    multiline,
)
.with_args(MULTILINE_ARGS);

/// `env`
pub const ENV: Command = Command::new("env", "List the console variables", env);

/// `declare <name> <value>`
pub const DECLARE: Command = Command::new("declare", "Set a console variable", declare).with_args(DECLARE_ARGS);

/// Every built-in command.
pub const CORE: &[Command] = &[HELP, HISTORY, ECHO, CLEAR, MULTILINE, ENV, DECLARE];

/// Register every built-in command.
pub fn register(registry: &mut Registry) -> Result<(), Error> {
    registry.register_all(CORE)
}

fn describe(out: &mut dyn fmt::Write, command: &Command) -> fmt::Result {
    out.write_str(command.name)?;
    if command.has_hint() {
        out.write_char(' ')?;
        command.write_hint(out)?;
    }
    writeln!(out)?;
    writeln!(out, "  {}", command.help)?;
    for spec in command.args.iter() {
        out.write_str("  ")?;
        spec.write_syntax(out)?;
        writeln!(out, "  {}", spec.help)?;
    }
    writeln!(out)
}

fn help(ctx: &mut Context<'_>) -> i32 {
    let registry = ctx.registry();
    match ctx.args.next_operand() {
        Some(name) => match registry.resolve(name) {
            Some(command) => {
                let _ = describe(ctx, command);
                status::OK
            }
            None => {
                let _ = writeln!(ctx, "help: unknown command '{}'", name);
                status::INVALID_ARG
            }
        },
        None => {
            for command in registry.sorted() {
                let _ = describe(ctx, command);
            }
            status::OK
        }
    }
}

fn history(ctx: &mut Context<'_>) -> i32 {
    let Some(history) = ctx.history() else {
        return status::NOT_SUPPORTED;
    };
    for (index, entry) in history.iter().enumerate() {
        let _ = writeln!(ctx, "{:>4}  {}", index + 1, entry);
    }
    status::OK
}

fn echo(ctx: &mut Context<'_>) -> i32 {
    let mut newline = true;
    while let Some(opt) = ctx.next_opt() {
        match opt {
            Ok(opt) if opt.flag == 'n' => newline = false,
            Ok(_) => {}
            Err(error) => {
                let _ = writeln!(ctx, "echo: {}", error);
                return status::INVALID_ARG;
            }
        }
    }

    for (index, word) in ctx.args.operands().iter().enumerate() {
        if index > 0 {
            let _ = ctx.write_char(' ');
        }
        let _ = ctx.write_str(word);
    }
    if newline {
        let _ = writeln!(ctx);
    }
    status::OK
}

fn clear(ctx: &mut Context<'_>) -> i32 {
    let _ = ctx.write_str("\x1b[H\x1b[2J");
    status::OK
}

fn multiline(ctx: &mut Context<'_>) -> i32 {
    let Some(session) = ctx.session() else {
        return status::NOT_SUPPORTED;
    };
    match ctx.args.next_operand() {
        None => {
            let state = if session.multiline() { "on" } else { "off" };
            let _ = writeln!(ctx, "multiline: {}", state);
        }
        Some("on") => session.set_multiline(true),
        Some("off") => session.set_multiline(false),
        Some(other) => {
            let _ = writeln!(ctx, "multiline: expected 'on' or 'off', got '{}'", other);
            return status::INVALID_ARG;
        }
    }
    status::OK
}

fn env(ctx: &mut Context<'_>) -> i32 {
    let Some(session) = ctx.session() else {
        return status::NOT_SUPPORTED;
    };
    session.for_each_var(&mut |name, value| {
        let _ = writeln!(ctx, "{}={}", name, value);
    });
    status::OK
}

fn declare(ctx: &mut Context<'_>) -> i32 {
    let Some(session) = ctx.session() else {
        return status::NOT_SUPPORTED;
    };
    let (Some(name), [first, rest @ ..]) = (ctx.args.next_operand(), ctx.args.operands()) else {
        let _ = writeln!(ctx, "declare: usage: declare <name> <value>");
        return status::INVALID_ARG;
    };

    let mut value = VarValue::new();
    let joined = value.push_str(first).is_ok()
        && rest
            .iter()
            .all(|word| value.push(' ').is_ok() && value.push_str(word).is_ok());
    let result = if joined {
        session.set_var(name, &value)
    } else {
        Err(VariableError::ValueTooLong)
    };

    match result {
        Ok(()) => status::OK,
        Err(error) => {
            let _ = writeln!(ctx, "declare: {}", error);
            status::INVALID_ARG
        }
    }
}
