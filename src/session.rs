//! Console settings that commands can change while the console runs.
//!
//! A [`Session`] is owned by the running console and lent to every handler
//! through [`Context::session`](crate::dispatch::Context::session). It holds the
//! multi-line editing switch and the table of console variables managed by the
//! `declare` and `env` commands.
//!
//! ```rust
//! use serial_console::session::Session;
//!
//! let session = Session::new(false);
//! session.set_var("BOARD", "devkit-c").unwrap();
//! session.set_multiline(true);
//!
//! assert_eq!(session.var("BOARD").as_deref(), Some("devkit-c"));
//! assert!(session.multiline());
//! ```

use crate::config::{MAX_VAR_NAME_LEN, MAX_VAR_VALUE_LEN, MAX_VARIABLES};
use core::cell::{Cell, RefCell};
use core::fmt;

/// Name of a console variable.
pub type VarName = heapless::String<MAX_VAR_NAME_LEN>;

/// Value of a console variable.
pub type VarValue = heapless::String<MAX_VAR_VALUE_LEN>;

type Variables = heapless::Vec<(VarName, VarValue), MAX_VARIABLES>;

/// Reasons a console variable cannot be set.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum VariableError {
    /// The name is empty, starts with a digit, or holds characters other than
    /// ASCII letters, digits and `_`.
    InvalidName,
    /// The name is longer than [`MAX_VAR_NAME_LEN`].
    NameTooLong,
    /// The value is longer than [`MAX_VAR_VALUE_LEN`].
    ValueTooLong,
    /// [`MAX_VARIABLES`] variables are already set.
    Full,
}

impl fmt::Display for VariableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            VariableError::InvalidName => "invalid variable name",
            VariableError::NameTooLong => "variable name too long",
            VariableError::ValueTooLong => "variable value too long",
            VariableError::Full => "too many variables",
        };
        f.write_str(message)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for VariableError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            VariableError::InvalidName => defmt::write!(f, "InvalidName"),
            VariableError::NameTooLong => defmt::write!(f, "NameTooLong"),
            VariableError::ValueTooLong => defmt::write!(f, "ValueTooLong"),
            VariableError::Full => defmt::write!(f, "Full"),
        }
    }
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        _ => false,
    }
}

/// Mutable settings of a running console.
#[derive(Debug, Default)]
pub struct Session {
    multiline: Cell<bool>,
    variables: RefCell<Variables>,
}

impl Session {
    /// A session with no variables.
    pub fn new(multiline: bool) -> Self {
        Self {
            multiline: Cell::new(multiline),
            variables: RefCell::new(Variables::new()),
        }
    }

    /// Whether lines may wrap over several terminal rows.
    pub fn multiline(&self) -> bool {
        self.multiline.get()
    }

    /// Switch multi-line editing. Takes effect with the next prompt.
    pub fn set_multiline(&self, multiline: bool) {
        self.multiline.set(multiline);
    }

    /// Set `name` to `value`, replacing the previous value.
    pub fn set_var(&self, name: &str, value: &str) -> Result<(), VariableError> {
        if !valid_name(name) {
            return Err(VariableError::InvalidName);
        }
        let key = VarName::try_from(name).map_err(|_| VariableError::NameTooLong)?;
        let value = VarValue::try_from(value).map_err(|_| VariableError::ValueTooLong)?;

        let mut variables = self.variables.borrow_mut();
        if let Some((_, slot)) = variables.iter_mut().find(|(known, _)| *known == key) {
            *slot = value;
            return Ok(());
        }
        variables
            .push((key, value))
            .map_err(|_| VariableError::Full)
    }

    /// The value of `name`, if it is set.
    pub fn var(&self, name: &str) -> Option<VarValue> {
        self.variables
            .borrow()
            .iter()
            .find(|(known, _)| known.as_str() == name)
            .map(|(_, value)| value.clone())
    }

    /// Number of variables set.
    pub fn var_count(&self) -> usize {
        self.variables.borrow().len()
    }

    /// Call `visit` with every variable, in the order they were first set.
    pub fn for_each_var(&self, visit: &mut dyn FnMut(&str, &str)) {
        // Visit a copy so `visit` may set variables itself
        let variables = self.variables.borrow().clone();
        for (name, value) in variables.iter() {
            visit(name, value);
        }
    }
}
