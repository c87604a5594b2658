//! Byte-stream transport abstraction for half-duplex servo buses.
//!
//! The protocol layers above only need five things from a line: open it,
//! write bytes, ask how many bytes are waiting, read bytes, and close it.
//! [`Transport`] captures that contract. Two implementations ship here:
//! - [`SerialTransport`] over a physical or virtual serial port
//! - [`MemoryTransport`], an in-process line for tests and dry runs
//!
//! This is the lowest layer of htsbus.

pub mod error;
pub mod memory;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::MemoryTransport;
pub use serial::{SerialConfig, SerialTransport, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT};
pub use traits::Transport;
