use std::io::{Read, Write};

use crate::error::Result;

/// A connected half-duplex byte line (implements Read + Write).
///
/// Opening is transport specific (see [`SerialTransport::open`]); everything
/// after that goes through this trait so the protocol layers can run against
/// a real port or an in-memory fake alike.
///
/// Reads follow the serial convention: a read that finds no data within the
/// line's timeout fails with [`std::io::ErrorKind::TimedOut`].
///
/// [`SerialTransport::open`]: crate::SerialTransport::open
pub trait Transport: Read + Write + Send {
    /// Number of received bytes waiting to be read.
    fn bytes_available(&self) -> Result<usize>;

    /// Discard any buffered input and output.
    fn clear(&mut self) -> Result<()>;

    /// Close the line. Further reads and writes fail.
    fn close(&mut self) -> Result<()>;

    /// Transport name for diagnostics.
    fn name(&self) -> &str;
}
