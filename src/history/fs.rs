//! Filesystem backed history store.

use super::HistoryStore;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};

/// Stores history as a plain text file, one entry per line.
///
/// Lines that are not valid UTF-8 are skipped when reading.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsHistoryStore;

impl FsHistoryStore {
    /// Create a store.
    pub fn new() -> Self {
        Self
    }
}

impl HistoryStore for FsHistoryStore {
    type Error = io::Error;

    fn read_lines(&mut self, path: &str, visit: &mut dyn FnMut(&str)) -> Result<(), Self::Error> {
        let reader = BufReader::new(File::open(path)?);
        for line in reader.split(b'\n') {
            let line = line?;
            let Ok(line) = core::str::from_utf8(&line) else {
                warn!("skipping history line that is not UTF-8 in {}", path);
                continue;
            };
            let line = line.trim_end_matches('\r');
            if !line.is_empty() {
                visit(line);
            }
        }
        Ok(())
    }

    fn write_lines(
        &mut self,
        path: &str,
        lines: &mut dyn Iterator<Item = &str>,
    ) -> Result<(), Self::Error> {
        let mut writer = BufWriter::new(File::create(path)?);
        for line in lines {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }
}
