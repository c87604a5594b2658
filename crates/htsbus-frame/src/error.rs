use crate::command::Command;

/// A caller-supplied value outside its legal domain.
///
/// Raised before anything is put on the wire.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{name} out of range ({min}..={max}): {value}")]
pub struct RangeError {
    pub name: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl RangeError {
    pub fn new(
        name: &'static str,
        value: impl Into<f64>,
        min: impl Into<f64>,
        max: impl Into<f64>,
    ) -> Self {
        Self {
            name,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        }
    }
}

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame does not start with `0x55 0x55`.
    #[error("invalid frame header {0:02x?} (expected [55, 55])")]
    InvalidHeader([u8; 2]),

    /// The reply came from a different servo than the one addressed.
    #[error("reply from servo {actual}, expected servo {expected}")]
    DestinationMismatch { expected: u8, actual: u8 },

    /// The reply carries a different command than the one requested.
    #[error("reply command {actual:#04x}, expected {expected}")]
    CommandMismatch { expected: Command, actual: u8 },

    /// The command byte is not in the catalog.
    #[error("unknown command opcode {0:#04x}")]
    UnknownCommand(u8),

    /// The trailing checksum disagrees with the frame contents.
    #[error("checksum mismatch (computed {expected:#04x}, received {actual:#04x})")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// The length byte cannot describe a frame.
    #[error("invalid length byte {0} (minimum 3)")]
    InvalidLength(u8),

    /// The payload size disagrees with the catalog entry for the command.
    #[error("{command} carries {expected} payload bytes, got {actual}")]
    PayloadLength {
        command: Command,
        expected: usize,
        actual: usize,
    },

    /// A parameter field has a width the codec does not handle.
    #[error("unsupported parameter width {0} (expected 1 or 2 bytes)")]
    InvalidWidth(usize),

    /// A value does not fit the field it is encoded into.
    #[error(transparent)]
    Range(#[from] RangeError),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The line was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
