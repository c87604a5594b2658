use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

#[derive(Debug, Default)]
struct Line {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    write_failure: Option<ErrorKind>,
    closed: bool,
}

/// In-memory transport.
///
/// Clones share one line, so a test can hand one clone to the bus and keep
/// another to queue device replies and inspect what the host wrote.
/// A read with nothing queued fails with `TimedOut`, as a serial read would.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    line: Arc<Mutex<Line>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if the device had sent them.
    pub fn push_incoming(&self, bytes: &[u8]) {
        self.lock().rx.extend(bytes);
    }

    /// Everything the host has written so far.
    pub fn written(&self) -> Vec<u8> {
        self.lock().tx.clone()
    }

    /// Drain and return everything the host has written so far.
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.lock().tx)
    }

    /// Make every subsequent write fail with `kind` (`None` restores writes).
    pub fn set_write_failure(&self, kind: Option<ErrorKind>) {
        self.lock().write_failure = kind;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, Line> {
        self.line.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Read for MemoryTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut line = self.lock();
        if line.closed {
            return Err(io::Error::new(ErrorKind::NotConnected, "line closed"));
        }
        if buf.is_empty() {
            return Ok(0);
        }
        if line.rx.is_empty() {
            return Err(io::Error::new(ErrorKind::TimedOut, "no data on line"));
        }

        let n = buf.len().min(line.rx.len());
        for (slot, byte) in buf.iter_mut().zip(line.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for MemoryTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut line = self.lock();
        if line.closed {
            return Err(io::Error::new(ErrorKind::NotConnected, "line closed"));
        }
        if let Some(kind) = line.write_failure {
            return Err(io::Error::from(kind));
        }
        line.tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for MemoryTransport {
    fn bytes_available(&self) -> Result<usize> {
        let line = self.lock();
        if line.closed {
            return Err(TransportError::Closed);
        }
        Ok(line.rx.len())
    }

    fn clear(&mut self) -> Result<()> {
        let mut line = self.lock();
        line.rx.clear();
        line.tx.clear();
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut line = self.lock();
        if line.closed {
            return Err(TransportError::Closed);
        }
        line.closed = true;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_line() {
        let device = MemoryTransport::new();
        let mut host = device.clone();

        host.write_all(&[0x55, 0x55, 0x01]).unwrap();
        assert_eq!(device.written(), vec![0x55, 0x55, 0x01]);

        device.push_incoming(&[1, 2, 3]);
        assert_eq!(host.bytes_available().unwrap(), 3);

        let mut buf = [0u8; 2];
        assert_eq!(host.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(host.bytes_available().unwrap(), 1);
    }

    #[test]
    fn empty_read_times_out() {
        let mut host = MemoryTransport::new();
        let mut buf = [0u8; 4];
        let err = host.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimedOut);
    }

    #[test]
    fn injected_write_failure() {
        let device = MemoryTransport::new();
        let mut host = device.clone();
        device.set_write_failure(Some(ErrorKind::BrokenPipe));

        let err = host.write(&[0xAA]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BrokenPipe);
        assert!(device.written().is_empty());

        device.set_write_failure(None);
        assert_eq!(host.write(&[0xAA]).unwrap(), 1);
    }

    #[test]
    fn close_rejects_further_io() {
        let device = MemoryTransport::new();
        let mut host = device.clone();
        host.close().unwrap();

        assert!(device.is_closed());
        assert!(host.write(&[0x00]).is_err());
        assert!(matches!(host.bytes_available(), Err(TransportError::Closed)));
        assert!(matches!(host.close(), Err(TransportError::Closed)));
    }

    #[test]
    fn take_written_drains() {
        let device = MemoryTransport::new();
        let mut host = device.clone();
        host.write_all(b"abc").unwrap();

        assert_eq!(device.take_written(), b"abc".to_vec());
        assert!(device.written().is_empty());
    }

    #[test]
    fn clear_drops_pending_bytes() {
        let device = MemoryTransport::new();
        let mut host = device.clone();
        device.push_incoming(&[9, 9]);
        host.clear().unwrap();
        assert_eq!(host.bytes_available().unwrap(), 0);
    }
}
