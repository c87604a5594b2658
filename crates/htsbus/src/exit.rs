use std::fmt;
use std::io;

use htsbus_frame::RangeError;
use htsbus_servo::ServoError;
use htsbus_transport::TransportError;

// Exit code constants aligned with rsfulmen/DDR-0002 semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::BrokenPipe | io::ErrorKind::NotConnected => FAILURE,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        TransportError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        TransportError::Open { ref source, .. }
            if source.kind() == serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) =>
        {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        TransportError::Closed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn range_error(context: &str, err: RangeError) -> CliError {
    CliError::new(USAGE, format!("{context}: {err}"))
}

pub fn servo_error(context: &str, err: ServoError) -> CliError {
    match err {
        ServoError::Range(err) => range_error(context, err),
        ServoError::Protocol { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        ServoError::Transport { command, source } => {
            let context = match command {
                Some(command) => format!("{context} ({command})"),
                None => context.to_string(),
            };
            transport_error(&context, source)
        }
        ServoError::Connection(source) => transport_error(context, source),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use htsbus_frame::{Command, FrameError};

    use super::*;

    #[test]
    fn reply_timeout_maps_to_124() {
        let err = servo_error(
            "status failed",
            ServoError::Transport {
                command: Some(Command::PosRead),
                source: TransportError::Timeout(std::time::Duration::from_secs(1)),
            },
        );
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.contains("SERVO_POS_READ"), "{}", err.message);
    }

    #[test]
    fn bad_reply_maps_to_data_invalid() {
        let err = servo_error(
            "status failed",
            ServoError::Protocol {
                command: Some(Command::TempRead),
                source: FrameError::InvalidHeader([0x55, 0x56]),
            },
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn range_maps_to_usage() {
        let err = servo_error(
            "move failed",
            ServoError::Range(RangeError::new("position", 1001, 0, 1000)),
        );
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn missing_port_maps_to_transport() {
        let err = transport_error(
            "open failed",
            TransportError::Open {
                path: "/dev/ttyMISSING".to_string(),
                source: serialport::Error::new(serialport::ErrorKind::NoDevice, "no such device"),
            },
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
    }

    #[test]
    fn unconnected_is_internal() {
        let err = servo_error("start failed", ServoError::NotConnected);
        assert_eq!(err.code, INTERNAL);
    }
}
