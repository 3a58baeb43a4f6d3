//! Serial transport.
//!
//! [`configure`] prepares one UART channel for interactive use and hands back a
//! [`SerialPort`], the single owner of that channel for the rest of the session.
//! The hardware itself sits behind the [`SerialDriver`] trait, implemented by the
//! board support code of the target (or by a mock in tests).
//!
//! Bring-up runs in a fixed order:
//!
//! 1. reject channels the device does not have, touching nothing
//! 2. drain pending output
//! 3. disable input buffering
//! 4. select line endings: CR ends a received line, LF is sent as CR LF
//! 5. install the interrupt driven driver
//! 6. apply the 8N1 line parameters, which needs the driver installed
//! 7. rebind the standard streams to `/dev/uart/<n>` when the channel is not the
//!    default console channel
//!
//! The line ending translation is done by the [`SerialPort`], so drivers only
//! move raw bytes.

pub mod error;

pub use error::IoError;

use crate::config::{ConfigurationError, SessionConfig};
use core::fmt::{self, Write as _};

/// Path prefix of the per-channel UART device files.
pub const UART_DEVICE_PREFIX: &str = "/dev/uart/";

/// UART line parameters. The console never uses a parity bit.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct UartParams {
    /// Baud rate.
    pub baud_rate: u32,
    /// Data bits per character.
    pub data_bits: u8,
    /// Stop bits.
    pub stop_bits: u8,
    /// Hardware flow control.
    pub flow_control: bool,
}

impl UartParams {
    /// 8 data bits, no parity, 1 stop bit, no flow control.
    pub const fn eight_n_one(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            data_bits: 8,
            stop_bits: 1,
            flow_control: false,
        }
    }
}

/// Line ending convention of one direction of a channel.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LineEnding {
    /// `\n`, passed through untouched.
    Lf,
    /// `\r`. Received CR becomes LF, sent LF becomes CR.
    Cr,
    /// `\r\n`. Received CR LF becomes LF, sent LF becomes CR LF.
    CrLf,
}

/// Hardware access for one UART peripheral family.
///
/// Every method takes the channel it applies to, mirroring the vendor UART APIs.
pub trait SerialDriver {
    /// Driver specific error.
    type Error: fmt::Debug;

    /// Number of channels the device has.
    fn channel_count(&self) -> u8;

    /// Channel the standard streams are bound to at boot.
    fn default_channel(&self) -> u8;

    /// Wait until pending output on `channel` has been sent.
    fn flush(&mut self, channel: u8) -> Result<(), Self::Error>;

    /// Enable or disable buffering of standard input.
    fn set_input_buffered(&mut self, buffered: bool);

    /// Install the interrupt driven driver with the given ring buffer sizes.
    fn install(&mut self, channel: u8, rx_buffer_size: usize, tx_buffer_size: usize) -> Result<(), Self::Error>;

    /// Apply line parameters. Only valid once the driver is installed.
    fn set_params(&mut self, channel: u8, params: &UartParams) -> Result<(), Self::Error>;

    /// Rebind standard input, output and error to the device file at `path`.
    fn redirect_std_streams(&mut self, channel: u8, path: &str) -> Result<(), Self::Error>;

    /// Read available bytes without blocking. `Ok(0)` means nothing arrived.
    fn read(&mut self, channel: u8, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write bytes, returning how many were accepted.
    fn write(&mut self, channel: u8, buf: &[u8]) -> Result<usize, Self::Error>;

    /// Called while waiting for input. Drivers may yield or sleep here.
    fn idle(&mut self) {}

    /// Block for at least `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

impl<D: SerialDriver + ?Sized> SerialDriver for &mut D {
    type Error = D::Error;

    fn channel_count(&self) -> u8 {
        (**self).channel_count()
    }

    fn default_channel(&self) -> u8 {
        (**self).default_channel()
    }

    fn flush(&mut self, channel: u8) -> Result<(), Self::Error> {
        (**self).flush(channel)
    }

    fn set_input_buffered(&mut self, buffered: bool) {
        (**self).set_input_buffered(buffered)
    }

    fn install(&mut self, channel: u8, rx_buffer_size: usize, tx_buffer_size: usize) -> Result<(), Self::Error> {
        (**self).install(channel, rx_buffer_size, tx_buffer_size)
    }

    fn set_params(&mut self, channel: u8, params: &UartParams) -> Result<(), Self::Error> {
        (**self).set_params(channel, params)
    }

    fn redirect_std_streams(&mut self, channel: u8, path: &str) -> Result<(), Self::Error> {
        (**self).redirect_std_streams(channel, path)
    }

    fn read(&mut self, channel: u8, buf: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).read(channel, buf)
    }

    fn write(&mut self, channel: u8, buf: &[u8]) -> Result<usize, Self::Error> {
        (**self).write(channel, buf)
    }

    fn idle(&mut self) {
        (**self).idle()
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

/// Byte level console I/O, as seen by the line editor and the REPL.
pub trait SerialIo {
    /// Read one byte if one is available.
    fn read_byte(&mut self) -> Result<Option<u8>, IoError>;

    /// Write all of `bytes`.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), IoError>;

    /// Wait until written bytes have been sent.
    fn flush(&mut self) -> Result<(), IoError>;

    /// Called between polls that returned no data.
    fn idle(&mut self) {}

    /// Block for at least `ms` milliseconds. Timeouts are measured with it.
    fn delay_ms(&mut self, ms: u32);

    /// Write a string.
    fn write_str(&mut self, s: &str) -> Result<(), IoError> {
        self.write_all(s.as_bytes())
    }
}

impl<S: SerialIo + ?Sized> SerialIo for &mut S {
    fn read_byte(&mut self) -> Result<Option<u8>, IoError> {
        (**self).read_byte()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), IoError> {
        (**self).write_all(bytes)
    }

    fn flush(&mut self) -> Result<(), IoError> {
        (**self).flush()
    }

    fn idle(&mut self) {
        (**self).idle()
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

/// [`fmt::Write`] adapter over a [`SerialIo`].
///
/// `fmt::Error` carries no detail, so the first I/O error is kept and can be
/// taken back with [`IoWriter::take_error`].
#[derive(Debug)]
pub struct IoWriter<'a, S: ?Sized> {
    io: &'a mut S,
    error: Option<IoError>,
}

impl<'a, S: SerialIo + ?Sized> IoWriter<'a, S> {
    /// Wrap `io`.
    pub fn new(io: &'a mut S) -> Self {
        Self { io, error: None }
    }

    /// The first error hit while writing, if any.
    pub fn take_error(&mut self) -> Option<IoError> {
        self.error.take()
    }
}

impl<S: SerialIo + ?Sized> fmt::Write for IoWriter<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.error.is_some() {
            return Err(fmt::Error);
        }
        self.io.write_all(s.as_bytes()).map_err(|error| {
            self.error = Some(error);
            fmt::Error
        })
    }
}

/// An open, configured serial channel.
#[derive(Debug)]
pub struct SerialPort<D> {
    driver: D,
    channel: u8,
    rx_ending: LineEnding,
    tx_ending: LineEnding,
    redirected: bool,
    skip_lf: bool,
}

impl<D: SerialDriver> SerialPort<D> {
    /// The channel this port owns.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Whether the standard streams were rebound to this channel.
    pub fn is_redirected(&self) -> bool {
        self.redirected
    }

    /// Receive line ending.
    pub fn rx_line_ending(&self) -> LineEnding {
        self.rx_ending
    }

    /// Transmit line ending.
    pub fn tx_line_ending(&self) -> LineEnding {
        self.tx_ending
    }

    /// Change the line ending conventions.
    pub fn set_line_endings(&mut self, rx: LineEnding, tx: LineEnding) {
        self.rx_ending = rx;
        self.tx_ending = tx;
        self.skip_lf = false;
    }

    /// The underlying driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The underlying driver, mutably.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Give the driver back.
    pub fn into_inner(self) -> D {
        self.driver
    }

    fn write_raw(&mut self, mut bytes: &[u8]) -> Result<(), IoError> {
        while !bytes.is_empty() {
            let written = self
                .driver
                .write(self.channel, bytes)
                .map_err(|_| IoError::Write)?;
            if written == 0 {
                return Err(IoError::Closed);
            }
            bytes = &bytes[written.min(bytes.len())..];
        }
        Ok(())
    }
}

impl<D: SerialDriver> SerialIo for SerialPort<D> {
    fn read_byte(&mut self) -> Result<Option<u8>, IoError> {
        loop {
            let mut byte = [0u8; 1];
            let read = self
                .driver
                .read(self.channel, &mut byte)
                .map_err(|_| IoError::Read)?;
            if read == 0 {
                return Ok(None);
            }

            let byte = byte[0];
            match (self.rx_ending, byte) {
                (LineEnding::Cr, b'\r') => return Ok(Some(b'\n')),
                (LineEnding::CrLf, b'\r') => {
                    self.skip_lf = true;
                    return Ok(Some(b'\n'));
                }
                (LineEnding::CrLf, b'\n') if self.skip_lf => {
                    self.skip_lf = false;
                }
                _ => {
                    self.skip_lf = false;
                    return Ok(Some(byte));
                }
            }
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), IoError> {
        let newline: &[u8] = match self.tx_ending {
            LineEnding::Lf => return self.write_raw(bytes),
            LineEnding::Cr => b"\r",
            LineEnding::CrLf => b"\r\n",
        };

        for (index, segment) in bytes.split(|&byte| byte == b'\n').enumerate() {
            if index > 0 {
                self.write_raw(newline)?;
            }
            self.write_raw(segment)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        self.driver.flush(self.channel).map_err(|_| IoError::Write)
    }

    fn idle(&mut self) {
        self.driver.idle()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.driver.delay_ms(ms)
    }
}

/// Prepare `config.channel` for console use.
///
/// # Errors
///
/// * [`ConfigurationError::InvalidChannel`] - the device has no such channel; the
///   driver is left untouched
/// * [`ConfigurationError::DriverInstall`] - the driver could not be installed
/// * [`ConfigurationError::ParamConfig`] - the line parameters were rejected
/// * [`ConfigurationError::StreamRedirect`] - the standard streams could not be
///   rebound
pub fn configure<D: SerialDriver>(
    mut driver: D,
    config: &SessionConfig<'_>,
) -> Result<SerialPort<D>, ConfigurationError> {
    let channel = config.channel;
    let count = driver.channel_count();
    if channel >= count {
        error!("serial channel {} out of range, device has {}", channel, count);
        return Err(ConfigurationError::InvalidChannel);
    }

    if driver.flush(channel).is_err() {
        warn!("flushing channel {} before configuration failed", channel);
    }
    driver.set_input_buffered(false);

    driver
        .install(channel, config.rx_buffer_size, config.tx_buffer_size)
        .map_err(|_| {
            error!("installing driver on channel {} failed", channel);
            ConfigurationError::DriverInstall
        })?;

    let params = UartParams::eight_n_one(config.baud_rate);
    driver.set_params(channel, &params).map_err(|_| {
        error!("configuring channel {} at {} baud failed", channel, config.baud_rate);
        ConfigurationError::ParamConfig
    })?;

    let mut redirected = false;
    if channel != driver.default_channel() {
        let mut path: heapless::String<16> = heapless::String::new();
        write!(path, "{}{}", UART_DEVICE_PREFIX, channel)
            .map_err(|_| ConfigurationError::StreamRedirect)?;
        driver.redirect_std_streams(channel, &path).map_err(|_| {
            error!("redirecting standard streams to channel {} failed", channel);
            ConfigurationError::StreamRedirect
        })?;
        redirected = true;
    }

    info!("serial channel {} ready at {} baud", channel, config.baud_rate);
    Ok(SerialPort {
        driver,
        channel,
        rx_ending: LineEnding::Cr,
        tx_ending: LineEnding::CrLf,
        redirected,
        skip_lf: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    #[derive(Default)]
    struct Loopback {
        rx: heapless::Deque<u8, 64>,
        tx: heapless::Vec<u8, 128>,
        chunk: usize,
        slept_ms: u32,
    }

    impl SerialDriver for Loopback {
        type Error = ();

        fn channel_count(&self) -> u8 {
            2
        }
        fn default_channel(&self) -> u8 {
            0
        }
        fn flush(&mut self, _channel: u8) -> Result<(), ()> {
            Ok(())
        }
        fn set_input_buffered(&mut self, _buffered: bool) {}
        fn install(&mut self, _channel: u8, _rx: usize, _tx: usize) -> Result<(), ()> {
            Ok(())
        }
        fn set_params(&mut self, _channel: u8, _params: &UartParams) -> Result<(), ()> {
            Ok(())
        }
        fn redirect_std_streams(&mut self, _channel: u8, _path: &str) -> Result<(), ()> {
            Ok(())
        }
        fn read(&mut self, _channel: u8, buf: &mut [u8]) -> Result<usize, ()> {
            match self.rx.pop_front() {
                Some(byte) => {
                    buf[0] = byte;
                    Ok(1)
                }
                None => Ok(0),
            }
        }
        fn write(&mut self, _channel: u8, buf: &[u8]) -> Result<usize, ()> {
            let n = if self.chunk == 0 { buf.len() } else { buf.len().min(self.chunk) };
            self.tx.extend_from_slice(&buf[..n]).map_err(|_| ())?;
            Ok(n)
        }
        fn delay_ms(&mut self, ms: u32) {
            self.slept_ms += ms;
        }
    }

    fn port(input: &[u8]) -> SerialPort<Loopback> {
        let mut driver = Loopback::default();
        for &byte in input {
            driver.rx.push_back(byte).unwrap();
        }
        configure(driver, &SessionConfig::default()).unwrap()
    }

    #[test]
    fn received_cr_becomes_lf() {
        let mut port = port(b"ls\r");
        assert_eq!(port.read_byte(), Ok(Some(b'l')));
        assert_eq!(port.read_byte(), Ok(Some(b's')));
        assert_eq!(port.read_byte(), Ok(Some(b'\n')));
        assert_eq!(port.read_byte(), Ok(None));
    }

    #[test]
    fn crlf_input_yields_a_single_lf() {
        let mut port = port(b"a\r\nb");
        port.set_line_endings(LineEnding::CrLf, LineEnding::CrLf);
        assert_eq!(port.read_byte(), Ok(Some(b'a')));
        assert_eq!(port.read_byte(), Ok(Some(b'\n')));
        assert_eq!(port.read_byte(), Ok(Some(b'b')));
    }

    #[test]
    fn sent_lf_becomes_crlf() {
        let mut port = port(b"");
        port.write_all(b"one\ntwo\n").unwrap();
        assert_eq!(port.driver().tx.as_slice(), b"one\r\ntwo\r\n");
    }

    #[test]
    fn short_writes_are_retried() {
        let mut port = port(b"");
        port.driver_mut().chunk = 2;
        port.write_all(b"hello").unwrap();
        assert_eq!(port.driver().tx.as_slice(), b"hello");
    }

    #[test]
    fn delays_reach_the_driver() {
        let mut port = port(b"");
        port.delay_ms(5);
        (&mut port).delay_ms(10);
        assert_eq!(port.driver().slept_ms, 15);
    }

    #[test]
    fn io_writer_formats_through_the_port() {
        let mut port = port(b"");
        let mut writer = IoWriter::new(&mut port);
        write!(writer, "0x{:x}\n", 7).unwrap();
        assert!(writer.take_error().is_none());
        assert_eq!(port.driver().tx.as_slice(), b"0x7\r\n");
    }
}
