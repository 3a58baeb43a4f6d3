//! Shared test doubles: a recording serial driver and a scripted terminal.

#![allow(dead_code)]

use serial_console::editor::PROBE_POLLS;
use serial_console::transport::{IoError, SerialDriver, SerialIo, UartParams};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One driver call, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Flush(u8),
    SetInputBuffered(bool),
    Install(u8, usize, usize),
    SetParams(u8, UartParams),
    Redirect(u8, String),
}

/// Serial driver double recording every configuration call.
#[derive(Debug, Default)]
pub struct MockDriver {
    pub channels: u8,
    pub default_channel: u8,
    pub calls: Vec<Call>,
    pub fail_install: bool,
    pub fail_params: bool,
    pub fail_redirect: bool,
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    /// Milliseconds passed in `delay_ms`.
    pub clock_ms: u32,
    /// Bytes that arrive once `clock_ms` reaches the given time.
    pub delayed: Option<(u32, Vec<u8>)>,
    /// Raised once `rx` runs dry and nothing else is due.
    pub on_drained: Option<Arc<AtomicBool>>,
}

impl MockDriver {
    pub fn new(channels: u8) -> Self {
        Self {
            channels,
            ..Self::default()
        }
    }

    pub fn with_input(mut self, input: &[u8]) -> Self {
        self.rx.extend(input.iter().copied());
        self
    }

    /// Deliver `input` only after `after_ms` milliseconds of delays.
    pub fn with_reply_after(mut self, after_ms: u32, input: &[u8]) -> Self {
        self.delayed = Some((after_ms, input.to_vec()));
        self
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.tx).into_owned()
    }
}

impl SerialDriver for MockDriver {
    type Error = &'static str;

    fn channel_count(&self) -> u8 {
        self.channels
    }

    fn default_channel(&self) -> u8 {
        self.default_channel
    }

    fn flush(&mut self, channel: u8) -> Result<(), Self::Error> {
        self.calls.push(Call::Flush(channel));
        Ok(())
    }

    fn set_input_buffered(&mut self, buffered: bool) {
        self.calls.push(Call::SetInputBuffered(buffered));
    }

    fn install(&mut self, channel: u8, rx_buffer_size: usize, tx_buffer_size: usize) -> Result<(), Self::Error> {
        self.calls.push(Call::Install(channel, rx_buffer_size, tx_buffer_size));
        if self.fail_install { Err("install") } else { Ok(()) }
    }

    fn set_params(&mut self, channel: u8, params: &UartParams) -> Result<(), Self::Error> {
        self.calls.push(Call::SetParams(channel, *params));
        if self.fail_params { Err("params") } else { Ok(()) }
    }

    fn redirect_std_streams(&mut self, channel: u8, path: &str) -> Result<(), Self::Error> {
        self.calls.push(Call::Redirect(channel, path.to_string()));
        if self.fail_redirect { Err("redirect") } else { Ok(()) }
    }

    fn read(&mut self, _channel: u8, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.rx.is_empty() && self.delayed.as_ref().is_some_and(|(due, _)| self.clock_ms >= *due) {
            if let Some((_, bytes)) = self.delayed.take() {
                self.rx.extend(bytes);
            }
        }
        match self.rx.pop_front() {
            Some(byte) => {
                buf[0] = byte;
                Ok(1)
            }
            None if self.delayed.is_some() => Ok(0),
            None => {
                if let Some(flag) = &self.on_drained {
                    flag.store(true, Ordering::Release);
                }
                Ok(0)
            }
        }
    }

    fn write(&mut self, _channel: u8, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock_ms += ms;
    }
}

/// Terminal double replaying a fixed script of keystrokes.
///
/// `None` entries are polls without data. Once the script is exhausted the
/// cancellation flag is raised, so a console loop ends cleanly. Delays take no
/// real time and are summed in `slept_ms`.
#[derive(Debug)]
pub struct ScriptedIo {
    input: VecDeque<Option<u8>>,
    pub output: Vec<u8>,
    pub slept_ms: u32,
    cancel: Arc<AtomicBool>,
    endless: bool,
    fail_reads: bool,
}

impl ScriptedIo {
    fn new(prefix: impl IntoIterator<Item = Option<u8>>, script: &str) -> Self {
        let mut input: VecDeque<Option<u8>> = prefix.into_iter().collect();
        input.extend(script.bytes().map(Some));
        Self {
            input,
            output: Vec::new(),
            slept_ms: 0,
            cancel: Arc::new(AtomicBool::new(false)),
            endless: false,
            fail_reads: false,
        }
    }

    /// A terminal that answers the status request, then types `script`.
    pub fn smart(script: &str) -> Self {
        Self::new(b"\x1b[0n".iter().map(|&byte| Some(byte)), script)
    }

    /// A terminal that ignores the status request, then types `script`.
    pub fn dumb(script: &str) -> Self {
        Self::new(std::iter::repeat_n(None, PROBE_POLLS), script)
    }

    /// Keep polling without data after the script instead of cancelling.
    pub fn endless(mut self) -> Self {
        self.endless = true;
        self
    }

    /// Fail every read once the script is exhausted.
    pub fn failing(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl SerialIo for ScriptedIo {
    fn read_byte(&mut self) -> Result<Option<u8>, IoError> {
        match self.input.pop_front() {
            Some(entry) => Ok(entry),
            None if self.fail_reads => Err(IoError::Read),
            None => {
                if !self.endless {
                    self.cancel.store(true, Ordering::Release);
                }
                Ok(None)
            }
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), IoError> {
        self.output.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        Ok(())
    }

    fn idle(&mut self) {
        if self.endless {
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        self.slept_ms += ms;
    }
}
