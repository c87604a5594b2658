use htsbus_frame::{Command, FrameError, RangeError};
use htsbus_transport::TransportError;

/// Errors that can occur in servo bus operations.
///
/// Every error ends the current operation; nothing is retried and the line
/// is not resynchronised. After a `Protocol` or `Transport` error during a
/// read the framing state of the line is unknown, and the caller should
/// disconnect and reconnect before continuing.
#[derive(Debug, thiserror::Error)]
pub enum ServoError {
    /// No transport is attached.
    #[error("servo bus is not connected")]
    NotConnected,

    /// A transport is already attached.
    #[error("servo bus is already connected")]
    AlreadyConnected,

    /// A parameter is outside its legal range. Nothing was sent.
    #[error(transparent)]
    Range(#[from] RangeError),

    /// A malformed or unexpected frame.
    #[error("protocol error{}: {source}", during(.command))]
    Protocol {
        command: Option<Command>,
        source: FrameError,
    },

    /// The line failed while a command was being written or its reply read.
    #[error("transport error{}: {source}", during(.command))]
    Transport {
        command: Option<Command>,
        source: TransportError,
    },

    /// Opening or closing the line failed.
    #[error("connection error: {0}")]
    Connection(#[from] TransportError),
}

fn during(command: &Option<Command>) -> String {
    command
        .map(|command| format!(" during {command}"))
        .unwrap_or_default()
}

impl ServoError {
    /// Classify a frame-layer failure that happened while handling `command`.
    ///
    /// Line failures (I/O errors, EOF) become `Transport`; everything else the
    /// frame layer can report is a `Protocol` error.
    pub fn from_frame(command: Option<Command>, err: FrameError) -> Self {
        match err {
            FrameError::Io(io) => ServoError::Transport {
                command,
                source: TransportError::Io(io),
            },
            FrameError::ConnectionClosed => ServoError::Transport {
                command,
                source: TransportError::Closed,
            },
            other => ServoError::Protocol {
                command,
                source: other,
            },
        }
    }

    /// The command in flight when the error happened, if any.
    pub fn command(&self) -> Option<Command> {
        match self {
            ServoError::Protocol { command, .. } | ServoError::Transport { command, .. } => {
                *command
            }
            _ => None,
        }
    }

    /// True for reply-side failures that leave the line framing unknown.
    pub fn needs_reconnect(&self) -> bool {
        matches!(
            self,
            ServoError::Protocol { .. } | ServoError::Transport { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ServoError>;
