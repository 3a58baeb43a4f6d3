//! Prompt rendering.

use crate::config::{MAX_RENDERED_PROMPT_LEN, PWD_PLACEHOLDER};
use core::fmt;

/// A prompt with its placeholders expanded.
pub type RenderedPrompt = heapless::String<MAX_RENDERED_PROMPT_LEN>;

/// Source of the current working directory shown in the prompt.
pub trait WorkingDirectory {
    /// Write the current working directory to `out`.
    fn write_working_dir(&self, out: &mut dyn fmt::Write) -> fmt::Result;
}

/// A fixed root directory, for targets without a filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RootDir;

impl WorkingDirectory for RootDir {
    fn write_working_dir(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str("/")
    }
}

/// The process working directory.
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct StdWorkingDir;

#[cfg(feature = "std")]
impl WorkingDirectory for StdWorkingDir {
    fn write_working_dir(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        match std::env::current_dir() {
            Ok(path) => write!(out, "{}", path.display()),
            Err(_) => out.write_str("?"),
        }
    }
}

/// Writer that keeps whatever fits and drops the rest.
struct Truncating(RenderedPrompt);

impl fmt::Write for Truncating {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for ch in s.chars() {
            if self.0.push(ch).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Expand every `%pwd%` in `template` with the current working directory.
///
/// Text beyond [`MAX_RENDERED_PROMPT_LEN`] bytes is dropped.
pub fn render(template: &str, cwd: &dyn WorkingDirectory) -> RenderedPrompt {
    let mut out = Truncating(RenderedPrompt::new());
    let mut rest = template;
    while let Some(start) = rest.find(PWD_PLACEHOLDER) {
        let _ = fmt::Write::write_str(&mut out, &rest[..start]);
        let _ = cwd.write_working_dir(&mut out);
        rest = &rest[start + PWD_PLACEHOLDER.len()..];
    }
    let _ = fmt::Write::write_str(&mut out, rest);
    out.0
}
