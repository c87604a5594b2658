use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Factory baud rate of HTS / LX-16A class servos.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default line timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Settings used to open a serial line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub path: String,
    /// Line speed in baud. Default: 115200.
    pub baud_rate: u32,
    /// Blocking read/write timeout. Default: 1 s.
    pub timeout: Duration,
}

impl SerialConfig {
    /// Config for `path` with default line settings.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: "/dev/ttyUSB0".to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Serial port transport.
///
/// Wraps a [`serialport`] handle. The handle is released on [`close`] or drop.
///
/// [`close`]: Transport::close
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    path: String,
    baud_rate: u32,
}

impl SerialTransport {
    /// Open a serial device (blocking).
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(&config.path, config.baud_rate)
            .timeout(config.timeout)
            .open()
            .map_err(|source| TransportError::Open {
                path: config.path.clone(),
                source,
            })?;
        debug!(path = %config.path, baud_rate = config.baud_rate, "opened serial port");

        Ok(Self {
            port: Some(port),
            path: config.path.clone(),
            baud_rate: config.baud_rate,
        })
    }

    /// Device path this transport was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Current line speed.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn port_mut(&mut self) -> io::Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "serial port closed"))
    }
}

impl Read for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port_mut()?.read(buf)
    }
}

impl Write for SerialTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port_mut()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port_mut()?.flush()
    }
}

impl Transport for SerialTransport {
    fn bytes_available(&self) -> Result<usize> {
        let port = self.port.as_ref().ok_or(TransportError::Closed)?;
        let waiting = port
            .bytes_to_read()
            .map_err(|err| TransportError::Io(err.into()))?;
        Ok(waiting as usize)
    }

    fn clear(&mut self) -> Result<()> {
        self.port_mut()?
            .clear(ClearBuffer::All)
            .map_err(|err| TransportError::Io(err.into()))
    }

    fn close(&mut self) -> Result<()> {
        let Some(mut port) = self.port.take() else {
            return Err(TransportError::Closed);
        };
        let flushed = port.flush();
        drop(port);
        debug!(path = %self.path, "closed serial port");
        flushed.map_err(Into::into)
    }

    fn name(&self) -> &str {
        "serial"
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("path", &self.path)
            .field("baud_rate", &self.baud_rate)
            .field("open", &self.port.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_factory_settings() {
        let cfg = SerialConfig::default();
        assert_eq!(cfg.baud_rate, 115_200);
        assert_eq!(cfg.timeout, Duration::from_secs(1));
    }

    #[test]
    fn new_keeps_defaults_for_line_settings() {
        let cfg = SerialConfig::new("/dev/ttyAMA0");
        assert_eq!(cfg.path, "/dev/ttyAMA0");
        assert_eq!(cfg.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(cfg.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn open_missing_device_fails() {
        let cfg = SerialConfig::new(format!(
            "/dev/htsbus-missing-{}",
            std::process::id()
        ));
        let result = SerialTransport::open(&cfg);
        assert!(matches!(result, Err(TransportError::Open { .. })));
    }
}
