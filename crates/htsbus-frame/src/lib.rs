//! Frame codec for HTS serial-bus servos.
//!
//! Every message on the bus is framed as:
//! - A 2-byte header `0x55 0x55`
//! - The servo id (254 is broadcast)
//! - A length byte (payload length + 3)
//! - A command opcode, the payload, and a one's-complement checksum
//!
//! This crate also holds the command catalog and the little-endian parameter
//! codec the servo API is built from.

pub mod codec;
pub mod command;
pub mod error;
pub mod id;
pub mod param;
pub mod reader;
pub mod writer;

pub use codec::{
    bytes_needed, checksum, decode_frame, encode_frame, encode_reply, Expect, Frame, HEADER,
    MIN_LENGTH, PREFIX_SIZE,
};
pub use command::{Command, Direction};
pub use error::{FrameError, RangeError, Result};
pub use id::ServoId;
pub use param::Width;
pub use reader::FrameReader;
pub use writer::FrameWriter;
