use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{bytes_needed, decode_frame, Expect, Frame, PREFIX_SIZE};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 64;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
/// Only the bytes the current frame still needs are requested from the
/// stream, so nothing past a frame boundary is ever consumed from the line.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Read> FrameReader<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Read the next complete frame (blocking) and validate it against `expect`.
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    /// A read timeout on the stream surfaces as `FrameError::Io`.
    pub fn read_frame(&mut self, expect: &Expect) -> Result<Frame> {
        loop {
            if self.buf.len() >= PREFIX_SIZE {
                if let Some(frame) = decode_frame(&mut self.buf, expect)? {
                    trace!(
                        destination = %frame.destination,
                        command = %frame.command,
                        payload = ?frame.payload.as_ref(),
                        "frame received"
                    );
                    return Ok(frame);
                }
            }

            let want = bytes_needed(&self.buf);
            let mut chunk = [0u8; u8::MAX as usize + PREFIX_SIZE];
            let read = match self.inner.read(&mut chunk[..want]) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Bytes of a partially received frame still held by the reader.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
