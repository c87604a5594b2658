use bytes::{BufMut, Bytes, BytesMut};

use crate::command::Command;
use crate::error::{FrameError, Result};
use crate::id::ServoId;

/// Frame header bytes.
pub const HEADER: [u8; 2] = [0x55, 0x55];

/// Bytes needed before a frame can be bounded: header (2) + id (1) + length (1).
pub const PREFIX_SIZE: usize = 4;

/// Smallest legal length byte (command + checksum + the length byte itself).
pub const MIN_LENGTH: u8 = 3;

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Servo the frame is addressed to (requests) or sent by (replies).
    pub destination: ServoId,
    pub command: Command,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(destination: ServoId, command: Command, payload: impl Into<Bytes>) -> Self {
        Self {
            destination,
            command,
            payload: payload.into(),
        }
    }
}

/// What a reply must look like to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expect {
    /// Sender of the reply. Broadcast accepts any sender.
    pub destination: ServoId,
    /// Required command, if any.
    pub command: Option<Command>,
}

impl Expect {
    /// The reply to `command` sent to `destination`.
    pub fn reply(destination: ServoId, command: Command) -> Self {
        Self {
            destination,
            command: Some(command),
        }
    }

    /// Any well-formed frame from `destination`.
    pub fn any_from(destination: ServoId) -> Self {
        Self {
            destination,
            command: None,
        }
    }
}

/// Checksum over the bytes from the id through the last payload byte.
pub fn checksum(bytes: &[u8]) -> u8 {
    !bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Encode a request frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────────┬────────┬────────────┬─────────┬──────────────┬──────────┐
/// │ Header    │ ID     │ Length     │ Command │ Payload      │ Checksum │
/// │ 0x55 0x55 │ (1B)   │ payload+3  │ (1B)    │ (0..N bytes) │ (1B)     │
/// └───────────┴────────┴────────────┴─────────┴──────────────┴──────────┘
/// ```
///
/// The checksum is `!(ID + Length + Command + Payload...)` truncated to a byte.
/// The payload size must match the catalog entry for `command`.
pub fn encode_frame(
    destination: ServoId,
    command: Command,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let expected = command.request_payload_len();
    if payload.len() != expected {
        return Err(FrameError::PayloadLength {
            command,
            expected,
            actual: payload.len(),
        });
    }
    put_frame(destination, command, payload, dst);
    Ok(())
}

/// Encode the frame a servo sends back for a read command.
///
/// Used by device simulators and tests; the payload size must match the
/// catalog's reply size for `command`.
pub fn encode_reply(
    source: ServoId,
    command: Command,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let expected = command.response_payload_len().unwrap_or(0);
    if payload.len() != expected {
        return Err(FrameError::PayloadLength {
            command,
            expected,
            actual: payload.len(),
        });
    }
    put_frame(source, command, payload, dst);
    Ok(())
}

fn put_frame(id: ServoId, command: Command, payload: &[u8], dst: &mut BytesMut) {
    let length = payload.len() as u8 + MIN_LENGTH;
    dst.reserve(frame_size(length));

    let start = dst.len();
    dst.put_slice(&HEADER);
    dst.put_u8(id.get());
    dst.put_u8(length);
    dst.put_u8(command.opcode());
    dst.put_slice(payload);
    let sum = checksum(&dst[start + HEADER.len()..]);
    dst.put_u8(sum);
}

/// Wire size of a frame with the given length byte.
fn frame_size(length: u8) -> usize {
    HEADER.len() + 1 + length as usize
}

/// How many more bytes `src` needs before it holds a complete frame.
///
/// Until the prefix is in, this is the rest of the prefix; afterwards the
/// length byte decides. Zero means [`decode_frame`] can make a decision.
pub fn bytes_needed(src: &[u8]) -> usize {
    if src.len() < PREFIX_SIZE {
        return PREFIX_SIZE - src.len();
    }
    frame_size(src[3]).saturating_sub(src.len())
}

/// Decode a frame from a buffer.
///
/// Header and sender are checked as soon as the prefix is available.
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes exactly the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, expect: &Expect) -> Result<Option<Frame>> {
    if src.len() < PREFIX_SIZE {
        return Ok(None); // Need more data
    }

    if src[0..2] != HEADER {
        return Err(FrameError::InvalidHeader([src[0], src[1]]));
    }

    let sender = src[2];
    if !expect.destination.is_broadcast() && sender != expect.destination.get() {
        return Err(FrameError::DestinationMismatch {
            expected: expect.destination.get(),
            actual: sender,
        });
    }
    let destination = ServoId::new(sender).map_err(|_| FrameError::DestinationMismatch {
        expected: expect.destination.get(),
        actual: sender,
    })?;

    let length = src[3];
    if length < MIN_LENGTH {
        return Err(FrameError::InvalidLength(length));
    }

    let total = frame_size(length);
    if src.len() < total {
        return Ok(None); // Need more data
    }

    let opcode = src[4];
    if let Some(expected) = expect.command {
        if opcode != expected.opcode() {
            return Err(FrameError::CommandMismatch {
                expected,
                actual: opcode,
            });
        }
    }

    let computed = checksum(&src[2..total - 1]);
    let received = src[total - 1];
    if computed != received {
        return Err(FrameError::ChecksumMismatch {
            expected: computed,
            actual: received,
        });
    }

    let command = Command::try_from(opcode)?;
    let payload_len = length as usize - MIN_LENGTH as usize;
    if let Some(expected) = expect.command.and_then(Command::response_payload_len) {
        if payload_len != expected {
            return Err(FrameError::PayloadLength {
                command,
                expected,
                actual: payload_len,
            });
        }
    }

    let frame = src.split_to(total).freeze();
    let payload = frame.slice(5..total - 1);

    Ok(Some(Frame {
        destination,
        command,
        payload,
    }))
}
