//! Session configuration and compile-time capacities.
//!
//! A [`SessionConfig`] is supplied once, before the console starts, and is never
//! changed afterwards. Every runtime limit it carries is bounded by one of the
//! compile-time capacities below, since all console storage is statically sized.
//!
//! The configuration can be built in code or read from a JSON document:
//!
//! ```rust
//! use serial_console::config::SessionConfig;
//!
//! let json = r#"{"baud_rate":921600,"channel":1,"prompt":"%pwd%> ","history_path":"/spiffs/.history"}"#;
//! let config = SessionConfig::from_json(json).unwrap();
//!
//! assert_eq!(config.baud_rate, 921600);
//! assert_eq!(config.history_path, Some("/spiffs/.history"));
//! // Fields missing from the document keep their defaults
//! assert_eq!(config.max_args, 8);
//! ```

use serde::Deserialize;

/// Maximum length of a command line, in bytes.
pub const MAX_LINE_LENGTH: usize = 256;

/// Maximum number of tokens in a command line, the command name included.
pub const MAX_ARGS: usize = 16;

/// Maximum number of registered commands. Must be a power of two.
pub const MAX_COMMANDS: usize = 32;

/// Maximum number of retained history entries.
pub const MAX_HISTORY_LEN: usize = 64;

/// Maximum length of the prompt template.
pub const MAX_PROMPT_LEN: usize = 64;

/// Maximum number of completion candidates offered for one TAB press.
pub const MAX_COMPLETIONS: usize = 16;

/// Capacity of a prompt once its placeholders have been expanded.
pub const MAX_RENDERED_PROMPT_LEN: usize = 2 * MAX_PROMPT_LEN;

/// Maximum length of the history file path.
pub const MAX_PATH_LEN: usize = 64;

/// Maximum number of console variables set with `declare`. Must be a power of two.
pub const MAX_VARIABLES: usize = 16;

/// Maximum length of a console variable name.
pub const MAX_VAR_NAME_LEN: usize = 32;

/// Maximum length of a console variable value.
pub const MAX_VAR_VALUE_LEN: usize = 64;

/// Placeholder in the prompt template replaced by the current working directory.
pub const PWD_PLACEHOLDER: &str = "%pwd%";

/// Errors raised while bringing the console up.
///
/// All of these are fatal: startup is aborted and the console does not run.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConfigurationError {
    /// The channel identifier is not below the device's channel count.
    InvalidChannel,
    /// The serial driver could not be installed on the channel.
    DriverInstall,
    /// The UART line parameters were rejected by the driver.
    ParamConfig,
    /// Standard streams could not be rebound to the channel's device path.
    StreamRedirect,
    /// `max_line_length` is zero or exceeds [`MAX_LINE_LENGTH`].
    LineLengthOutOfRange,
    /// `max_args` is zero or exceeds [`MAX_ARGS`].
    ArgCountOutOfRange,
    /// `max_history_len` exceeds [`MAX_HISTORY_LEN`].
    HistoryLengthOutOfRange,
    /// The prompt template is longer than [`MAX_PROMPT_LEN`].
    PromptTooLong,
    /// The history file path is longer than [`MAX_PATH_LEN`].
    HistoryPathTooLong,
    /// The JSON configuration document could not be parsed.
    Json,
}

impl ConfigurationError {
    /// Short human readable description.
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidChannel => "invalid serial channel",
            Self::DriverInstall => "serial driver install failed",
            Self::ParamConfig => "UART parameter configuration failed",
            Self::StreamRedirect => "standard stream redirection failed",
            Self::LineLengthOutOfRange => "max line length out of range",
            Self::ArgCountOutOfRange => "max argument count out of range",
            Self::HistoryLengthOutOfRange => "max history length out of range",
            Self::PromptTooLong => "prompt template too long",
            Self::HistoryPathTooLong => "history file path too long",
            Self::Json => "malformed configuration document",
        }
    }
}

impl core::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigurationError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ConfigurationError::InvalidChannel => defmt::write!(f, "InvalidChannel"),
            ConfigurationError::DriverInstall => defmt::write!(f, "DriverInstall"),
            ConfigurationError::ParamConfig => defmt::write!(f, "ParamConfig"),
            ConfigurationError::StreamRedirect => defmt::write!(f, "StreamRedirect"),
            ConfigurationError::LineLengthOutOfRange => defmt::write!(f, "LineLengthOutOfRange"),
            ConfigurationError::ArgCountOutOfRange => defmt::write!(f, "ArgCountOutOfRange"),
            ConfigurationError::HistoryLengthOutOfRange => {
                defmt::write!(f, "HistoryLengthOutOfRange")
            }
            ConfigurationError::PromptTooLong => defmt::write!(f, "PromptTooLong"),
            ConfigurationError::HistoryPathTooLong => defmt::write!(f, "HistoryPathTooLong"),
            ConfigurationError::Json => defmt::write!(f, "Json"),
        }
    }
}

/// Parameters of one console session.
///
/// String fields borrow from the caller (or from the JSON document they were
/// parsed from); the console copies what it needs to keep at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig<'a> {
    /// UART baud rate.
    pub baud_rate: u32,
    /// Serial channel (UART number) the console runs on.
    pub channel: u8,
    /// Receive ring buffer size handed to the driver.
    pub rx_buffer_size: usize,
    /// Transmit ring buffer size handed to the driver; 0 means blocking writes.
    pub tx_buffer_size: usize,
    /// Longest line the editor accepts.
    pub max_line_length: usize,
    /// Most tokens (command name included) a line may split into.
    pub max_args: usize,
    /// Most history entries kept in memory and on disk.
    pub max_history_len: usize,
    /// Where history is persisted; `None` disables persistence.
    #[serde(borrow)]
    pub history_path: Option<&'a str>,
    /// Prompt template; `%pwd%` is replaced by the working directory.
    pub prompt: &'a str,
    /// SGR color code used for inline hints.
    pub hint_color: u8,
    /// Whether inline hints are drawn bold.
    pub hint_bold: bool,
    /// Ask the editor for multi-line editing.
    pub multiline: bool,
    /// Stack size of the REPL thread when spawned.
    pub task_stack_size: usize,
}

impl Default for SessionConfig<'_> {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            channel: 0,
            rx_buffer_size: 256,
            tx_buffer_size: 0,
            max_line_length: MAX_LINE_LENGTH,
            max_args: 8,
            max_history_len: 40,
            history_path: None,
            prompt: "ESP32> ",
            hint_color: 90,
            hint_bold: false,
            multiline: false,
            task_stack_size: 16 * 1024,
        }
    }
}

impl<'a> SessionConfig<'a> {
    /// Parse a configuration from a JSON document.
    ///
    /// Missing fields take their default value. The result is validated.
    pub fn from_json(json: &'a str) -> Result<Self, ConfigurationError> {
        let (config, _) = serde_json_core::from_str::<SessionConfig<'a>>(json)
            .map_err(|_| ConfigurationError::Json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the serial channel.
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    /// Set the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the prompt template.
    pub fn with_prompt(mut self, prompt: &'a str) -> Self {
        self.prompt = prompt;
        self
    }

    /// Enable history persistence at `path`.
    pub fn with_history_path(mut self, path: &'a str) -> Self {
        self.history_path = Some(path);
        self
    }

    /// Set the number of retained history entries.
    pub fn with_max_history_len(mut self, len: usize) -> Self {
        self.max_history_len = len;
        self
    }

    /// Set the maximum line length.
    pub fn with_max_line_length(mut self, len: usize) -> Self {
        self.max_line_length = len;
        self
    }

    /// Set the maximum number of tokens per line.
    pub fn with_max_args(mut self, max_args: usize) -> Self {
        self.max_args = max_args;
        self
    }

    /// Check every runtime limit against the compile-time capacities.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_line_length == 0 || self.max_line_length > MAX_LINE_LENGTH {
            return Err(ConfigurationError::LineLengthOutOfRange);
        }
        if self.max_args == 0 || self.max_args > MAX_ARGS {
            return Err(ConfigurationError::ArgCountOutOfRange);
        }
        if self.max_history_len > MAX_HISTORY_LEN {
            return Err(ConfigurationError::HistoryLengthOutOfRange);
        }
        if self.prompt.len() > MAX_PROMPT_LEN {
            return Err(ConfigurationError::PromptTooLong);
        }
        if self.history_path.is_some_and(|path| path.len() > MAX_PATH_LEN) {
            return Err(ConfigurationError::HistoryPathTooLong);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SessionConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_limits_above_capacity() {
        let config = SessionConfig::default().with_max_line_length(MAX_LINE_LENGTH + 1);
        assert_eq!(config.validate(), Err(ConfigurationError::LineLengthOutOfRange));

        let config = SessionConfig::default().with_max_args(0);
        assert_eq!(config.validate(), Err(ConfigurationError::ArgCountOutOfRange));

        let config = SessionConfig::default().with_max_history_len(MAX_HISTORY_LEN + 1);
        assert_eq!(config.validate(), Err(ConfigurationError::HistoryLengthOutOfRange));
    }

    #[test]
    fn json_overrides_only_given_fields() {
        let config = SessionConfig::from_json(r#"{"channel":2,"multiline":true}"#).unwrap();
        assert_eq!(config.channel, 2);
        assert!(config.multiline);
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.history_path, None);
    }

    #[test]
    fn json_with_invalid_limits_is_rejected() {
        assert_eq!(
            SessionConfig::from_json(r#"{"max_args":99}"#),
            Err(ConfigurationError::ArgCountOutOfRange)
        );
        assert_eq!(
            SessionConfig::from_json("{not json"),
            Err(ConfigurationError::Json)
        );
    }
}
