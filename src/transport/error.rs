//! Error types for serial I/O

/// Failures of an open serial channel.
///
/// These end the console loop; they are never reported as command failures.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum IoError {
    /// Reading from the channel failed.
    Read,
    /// Writing to the channel failed.
    Write,
    /// The channel was closed underneath the console.
    Closed,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let message = match self {
            IoError::Read => "serial read failed",
            IoError::Write => "serial write failed",
            IoError::Closed => "serial channel closed",
        };
        f.write_str(message)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IoError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            IoError::Read => defmt::write!(f, "Read"),
            IoError::Write => defmt::write!(f, "Write"),
            IoError::Closed => defmt::write!(f, "Closed"),
        }
    }
}
