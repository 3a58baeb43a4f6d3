//! Line history with bounded length and pluggable persistence.
//!
//! [`History`] keeps accepted lines oldest first. Once it holds `max_len` entries,
//! each new line evicts the oldest one. Persistence goes through a
//! [`HistoryStore`], which reads and writes a newline-delimited file of entries,
//! oldest first:
//!
//! ```text
//! help
//! echo hi
//! ls /
//! ```
//!
//! Stores are best effort. A missing or unreadable file only means there is no
//! prior history.

#[cfg(feature = "std")]
pub mod fs;

#[cfg(feature = "std")]
pub use fs::FsHistoryStore;

use crate::config::{MAX_HISTORY_LEN, MAX_LINE_LENGTH, MAX_PATH_LEN};
use core::convert::Infallible;
use core::fmt;
use heapless::Deque;

/// A single line of console input.
pub type Line = heapless::String<MAX_LINE_LENGTH>;

/// History persistence errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The store could not provide the history file.
    Load,
    /// The store could not write the history file.
    Save,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Load => f.write_str("history load failed"),
            Error::Save => f.write_str("history save failed"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Load => defmt::write!(f, "Load"),
            Error::Save => defmt::write!(f, "Save"),
        }
    }
}

/// Backend reading and writing history files.
pub trait HistoryStore {
    /// Store specific error.
    type Error: fmt::Debug;

    /// Call `visit` with every entry stored at `path`, oldest first.
    fn read_lines(&mut self, path: &str, visit: &mut dyn FnMut(&str)) -> Result<(), Self::Error>;

    /// Replace the file at `path` with `lines`, oldest first.
    fn write_lines(
        &mut self,
        path: &str,
        lines: &mut dyn Iterator<Item = &str>,
    ) -> Result<(), Self::Error>;
}

/// Bounded, oldest-first line history.
#[derive(Debug, Clone)]
pub struct History {
    entries: Deque<Line, MAX_HISTORY_LEN>,
    max_len: usize,
}

impl History {
    /// An empty history holding up to [`MAX_HISTORY_LEN`] entries.
    pub const fn new() -> Self {
        Self {
            entries: Deque::new(),
            max_len: MAX_HISTORY_LEN,
        }
    }

    /// An empty history holding up to `max_len` entries.
    pub fn with_max_len(max_len: usize) -> Self {
        let mut history = Self::new();
        history.set_max_len(max_len);
        history
    }

    /// The current entry limit.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Change the entry limit, evicting the oldest entries if needed.
    ///
    /// The limit is capped at [`MAX_HISTORY_LEN`].
    pub fn set_max_len(&mut self, max_len: usize) {
        self.max_len = max_len.min(MAX_HISTORY_LEN);
        while self.entries.len() > self.max_len {
            self.entries.pop_front();
        }
    }

    /// Append a line.
    ///
    /// Blank lines and repeats of the newest entry are not recorded. Lines longer
    /// than [`MAX_LINE_LENGTH`] are truncated. Returns whether the line was added.
    pub fn push(&mut self, line: &str) -> bool {
        if self.max_len == 0 || line.trim().is_empty() {
            return false;
        }
        if self.newest() == Some(line) {
            return false;
        }

        let mut entry = Line::new();
        for ch in line.chars() {
            if entry.push(ch).is_err() {
                break;
            }
        }

        while self.entries.len() >= self.max_len {
            self.entries.pop_front();
        }
        // Room was just made above
        let _ = self.entries.push_back(entry);
        true
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, 0 being the oldest.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.iter().nth(index).map(|entry| entry.as_str())
    }

    /// Entry `back` steps from the newest one, 0 being the newest.
    pub fn recent(&self, back: usize) -> Option<&str> {
        self.entries.iter().rev().nth(back).map(|entry| entry.as_str())
    }

    /// The newest entry.
    pub fn newest(&self) -> Option<&str> {
        self.entries.back().map(|entry| entry.as_str())
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.entries.iter().map(|entry| entry.as_str())
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Append the entries stored at `path`.
    ///
    /// Returns the number of entries added. Entries beyond the limit evict older
    /// ones as usual, so only the newest `max_len` survive.
    pub fn load<S: HistoryStore + ?Sized>(&mut self, store: &mut S, path: &str) -> Result<usize, Error> {
        let mut added = 0;
        store
            .read_lines(path, &mut |line| {
                if self.push(line) {
                    added += 1;
                }
            })
            .map_err(|_| Error::Load)?;
        Ok(added)
    }

    /// Write every entry to `path`, replacing what was there.
    pub fn save<S: HistoryStore + ?Sized>(&self, store: &mut S, path: &str) -> Result<(), Error> {
        let mut lines = self.iter();
        store
            .write_lines(path, &mut lines)
            .map_err(|_| Error::Save)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

/// A store that keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHistory;

impl HistoryStore for NoHistory {
    type Error = Infallible;

    fn read_lines(&mut self, _path: &str, _visit: &mut dyn FnMut(&str)) -> Result<(), Self::Error> {
        Ok(())
    }

    fn write_lines(
        &mut self,
        _path: &str,
        _lines: &mut dyn Iterator<Item = &str>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// [`MemoryStore`] errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MemoryStoreError {
    /// Nothing has been written under the requested path.
    NotFound,
    /// A line does not fit the store even on its own.
    NoSpace,
    /// The path is longer than [`MAX_PATH_LEN`].
    PathTooLong,
}

/// A single-file store kept in RAM.
///
/// Holds the newline-delimited image of the last file written, which makes it
/// usable on targets without a filesystem and in tests. When the lines written
/// do not all fit, the oldest are left out so the newest are kept.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore<const N: usize> {
    path: heapless::String<MAX_PATH_LEN>,
    data: heapless::String<N>,
}

impl<const N: usize> MemoryStore<N> {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            path: heapless::String::new(),
            data: heapless::String::new(),
        }
    }

    /// A store preloaded with a file image.
    pub fn with_contents(path: &str, contents: &str) -> Result<Self, MemoryStoreError> {
        let mut store = Self::new();
        store.path = heapless::String::try_from(path).map_err(|_| MemoryStoreError::PathTooLong)?;
        store.data = heapless::String::try_from(contents).map_err(|_| MemoryStoreError::NoSpace)?;
        Ok(store)
    }

    /// Path of the stored file, empty if nothing was written.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw file image.
    pub fn contents(&self) -> &str {
        &self.data
    }
}

impl<const N: usize> HistoryStore for MemoryStore<N> {
    type Error = MemoryStoreError;

    fn read_lines(&mut self, path: &str, visit: &mut dyn FnMut(&str)) -> Result<(), Self::Error> {
        if self.path.is_empty() || self.path.as_str() != path {
            return Err(MemoryStoreError::NotFound);
        }
        self.data
            .split('\n')
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .for_each(|line| visit(line));
        Ok(())
    }

    fn write_lines(
        &mut self,
        path: &str,
        lines: &mut dyn Iterator<Item = &str>,
    ) -> Result<(), Self::Error> {
        let path = heapless::String::try_from(path).map_err(|_| MemoryStoreError::PathTooLong)?;

        // Build the new image aside so a failed write leaves the old one
        let mut image: heapless::String<N> = heapless::String::new();
        let mut dropped = 0usize;
        for line in lines {
            if line.len() >= N {
                return Err(MemoryStoreError::NoSpace);
            }
            while image.len() + line.len() + 1 > N {
                let cut = image.find('\n').map_or(image.len(), |index| index + 1);
                image = heapless::String::try_from(&image[cut..]).map_err(|_| MemoryStoreError::NoSpace)?;
                dropped += 1;
            }
            image.push_str(line).map_err(|_| MemoryStoreError::NoSpace)?;
            image.push('\n').map_err(|_| MemoryStoreError::NoSpace)?;
        }
        if dropped > 0 {
            debug!("history image full, left out {} oldest lines", dropped);
        }

        self.path = path;
        self.data = image;
        Ok(())
    }
}
