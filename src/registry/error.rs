//! Error types for command registration

/// Reasons a command cannot be registered.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The command name is empty.
    EmptyName,
    /// The command name contains whitespace and could never be typed.
    InvalidName,
    /// A command with the same name is already registered; the existing one is kept.
    DuplicateName,
    /// The registry has no free slot left.
    RegistryFull,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let message = match self {
            Error::EmptyName => "command name is empty",
            Error::InvalidName => "command name contains whitespace",
            Error::DuplicateName => "command already registered",
            Error::RegistryFull => "command registry is full",
        };
        f.write_str(message)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::EmptyName => defmt::write!(f, "EmptyName"),
            Error::InvalidName => defmt::write!(f, "InvalidName"),
            Error::DuplicateName => defmt::write!(f, "DuplicateName"),
            Error::RegistryFull => defmt::write!(f, "RegistryFull"),
        }
    }
}
