//! Command line tokenizer and option scanner.
//!
//! [`ArgBuffer`] splits a raw line into arguments. Splitting happens in place in
//! a fixed-size copy of the line, so quoted arguments can be unescaped without
//! allocating:
//!
//! ```text
//! echo hello world                    # 3 args: ["echo", "hello", "world"]
//! config "device name" value          # 3 args: ["config", "device name", "value"]
//! echo "Line 1\nLine 2"               # 2 args: ["echo", "Line 1<LF>Line 2"]
//! path "C:\\Program Files\\App"       # 2 args: ["path", "C:\Program Files\App"]
//! ```
//!
//! [`Args`] walks the split arguments the way `getopt` does. Its cursor lives in
//! the value itself; every dispatch builds a fresh one, so no scan state survives
//! from one command to the next.

use crate::config::{MAX_ARGS, MAX_LINE_LENGTH};
use crate::registry::ArgSpec;
use core::str;

/// ASCII space character (0x20).
pub const ASCII_SPACE: u8 = 0x20;
/// ASCII horizontal tab character (0x09).
pub const ASCII_TAB: u8 = 0x09;

/// Reasons a line cannot be split into arguments.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SplitError {
    /// The line does not fit the split buffer.
    LineTooLong,
    /// The line holds more arguments than allowed.
    TooManyArguments,
}

/// A command line split into arguments.
///
/// `argv[0]` is the command name.
#[derive(Debug)]
pub struct ArgBuffer {
    buffer: [u8; MAX_LINE_LENGTH],
    len: usize,
    argc: usize,
    argv_starts: [usize; MAX_ARGS],
    argv_lens: [usize; MAX_ARGS],
}

fn is_space(byte: u8) -> bool {
    byte == ASCII_SPACE || byte == ASCII_TAB
}

impl ArgBuffer {
    fn empty() -> Self {
        Self {
            buffer: [0; MAX_LINE_LENGTH],
            len: 0,
            argc: 0,
            argv_starts: [0; MAX_ARGS],
            argv_lens: [0; MAX_ARGS],
        }
    }

    /// Split `line` into at most `max_args` arguments.
    ///
    /// Arguments are separated by spaces or tabs. A double quote starts an
    /// argument that may contain spaces and the escapes `\"`, `\\`, `\n`, `\t`
    /// and `\r`; any other escaped character is kept as is. An unterminated
    /// quote runs to the end of the line.
    pub fn split(line: &str, max_args: usize) -> Result<Self, SplitError> {
        let bytes = line.as_bytes();
        if bytes.len() > MAX_LINE_LENGTH {
            return Err(SplitError::LineTooLong);
        }
        let max_args = max_args.min(MAX_ARGS);

        let mut args = Self::empty();
        args.buffer[..bytes.len()].copy_from_slice(bytes);
        args.len = bytes.len();

        let len = args.len;
        let mut i = 0;
        loop {
            // Skip leading whitespace
            while i < len && is_space(args.buffer[i]) {
                i += 1;
            }
            if i >= len {
                break;
            }
            if args.argc >= max_args {
                return Err(SplitError::TooManyArguments);
            }

            if args.buffer[i] == b'"' {
                i += 1; // Skip opening quote
                let start = i;
                let mut write_pos = i;

                while i < len {
                    let byte = args.buffer[i];
                    if byte == b'\\' && i + 1 < len {
                        let escaped = args.buffer[i + 1];
                        args.buffer[write_pos] = match escaped {
                            b'n' => b'\n',
                            b't' => b'\t',
                            b'r' => b'\r',
                            other => other,
                        };
                        write_pos += 1;
                        i += 2;
                    } else if byte == b'"' {
                        i += 1; // Skip closing quote
                        break;
                    } else {
                        args.buffer[write_pos] = byte;
                        write_pos += 1;
                        i += 1;
                    }
                }

                args.push(start, write_pos - start);
            } else {
                let start = i;
                while i < len && !is_space(args.buffer[i]) && args.buffer[i] != b'"' {
                    i += 1;
                }
                args.push(start, i - start);
            }
        }

        Ok(args)
    }

    fn push(&mut self, start: usize, len: usize) {
        self.argv_starts[self.argc] = start;
        self.argv_lens[self.argc] = len;
        self.argc += 1;
    }

    /// Number of arguments, the command name included.
    pub fn argc(&self) -> usize {
        self.argc
    }

    /// Argument at `index`; index 0 is the command name.
    pub fn get(&self, index: usize) -> Option<&str> {
        if index >= self.argc {
            return None;
        }
        let start = self.argv_starts[index];
        let len = self.argv_lens[index];
        str::from_utf8(&self.buffer[start..start + len]).ok()
    }

    /// All arguments as string slices.
    pub fn argv(&self) -> heapless::Vec<&str, MAX_ARGS> {
        let mut argv = heapless::Vec::new();
        for index in 0..self.argc {
            // argc never exceeds MAX_ARGS
            let _ = argv.push(self.get(index).unwrap_or(""));
        }
        argv
    }
}

/// An option returned by [`Args::next_opt`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Opt<'a> {
    /// The option character, without the leading dash.
    pub flag: char,
    /// The option's value, for options declared with one.
    pub value: Option<&'a str>,
}

/// Option scanning errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OptError {
    /// The option is not declared in the command's argument specification.
    Unknown(char),
    /// The option requires a value and none followed it.
    MissingValue(char),
}

impl core::fmt::Display for OptError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unknown(flag) => write!(f, "Unknown option: {}", flag),
            Self::MissingValue(flag) => write!(f, "Missing arg for {}", flag),
        }
    }
}

/// Argument vector handed to a command handler, with a `getopt`-style cursor.
#[derive(Debug, Clone)]
pub struct Args<'a> {
    argv: &'a [&'a str],
    cursor: usize,
    offset: usize,
}

impl<'a> Args<'a> {
    /// Index of the first argument after the command name.
    pub const FIRST: usize = 1;

    /// Wrap an argument vector; the cursor starts right after the command name.
    pub fn new(argv: &'a [&'a str]) -> Self {
        Self {
            argv,
            cursor: Self::FIRST,
            offset: 0,
        }
    }

    /// Number of arguments, the command name included.
    pub fn argc(&self) -> usize {
        self.argv.len()
    }

    /// The full argument vector.
    pub fn argv(&self) -> &'a [&'a str] {
        self.argv
    }

    /// The command name (`argv[0]`).
    pub fn command(&self) -> &'a str {
        self.argv.first().copied().unwrap_or("")
    }

    /// Argument at `index`.
    pub fn get(&self, index: usize) -> Option<&'a str> {
        self.argv.get(index).copied()
    }

    /// Index of the next argument to be scanned.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Rewind the scanner to its initial position.
    pub fn rewind(&mut self) {
        self.cursor = Self::FIRST;
        self.offset = 0;
    }

    /// Scan the next option.
    ///
    /// Options are recognized against `specs`: `-x` for a flag, `-x value` or
    /// `-xvalue` for a spec with a value. Flags may be grouped (`-ab`). Scanning
    /// stops at the first operand, at a lone `-`, or after `--` (which is
    /// consumed). Returns `None` once there are no more options.
    pub fn next_opt(&mut self, specs: &[ArgSpec]) -> Option<Result<Opt<'a>, OptError>> {
        if self.offset == 0 {
            let arg = *self.argv.get(self.cursor)?;
            if arg == "--" {
                self.cursor += 1;
                return None;
            }
            if arg.len() < 2 || !arg.starts_with('-') {
                return None;
            }
            self.offset = 1;
        }

        let arg = self.argv[self.cursor];
        let flag = arg[self.offset..].chars().next()?;
        self.offset += flag.len_utf8();
        let at_end = self.offset >= arg.len();

        let spec = specs.iter().find(|spec| spec.short == Some(flag));
        let result = match spec {
            None => {
                if at_end {
                    self.advance();
                }
                Err(OptError::Unknown(flag))
            }
            Some(spec) if spec.value.is_some() => {
                if !at_end {
                    let value = &arg[self.offset..];
                    self.advance();
                    Ok(Opt {
                        flag,
                        value: Some(value),
                    })
                } else {
                    self.advance();
                    match self.argv.get(self.cursor) {
                        Some(value) => {
                            self.cursor += 1;
                            Ok(Opt {
                                flag,
                                value: Some(*value),
                            })
                        }
                        None => Err(OptError::MissingValue(flag)),
                    }
                }
            }
            Some(_) => {
                if at_end {
                    self.advance();
                }
                Ok(Opt { flag, value: None })
            }
        };

        Some(result)
    }

    /// Arguments from the cursor to the end.
    pub fn operands(&self) -> &'a [&'a str] {
        self.argv.get(self.cursor..).unwrap_or(&[])
    }

    /// Take the next operand and move the cursor past it.
    pub fn next_operand(&mut self) -> Option<&'a str> {
        let operand = self.argv.get(self.cursor).copied()?;
        self.advance();
        Some(operand)
    }

    fn advance(&mut self) {
        self.cursor += 1;
        self.offset = 0;
    }
}
