//! Command catalog.
//!
//! Every opcode the servo understands, with its direction and payload sizes.
//! Request sizes are what the host sends; response sizes are what a read
//! command's reply carries. Discriminants are the wire opcodes, so a
//! duplicate opcode fails to compile.

use std::fmt;

use crate::error::FrameError;

/// Which way the data of a command flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Host sets something on the servo. No reply.
    Write,
    /// Host asks the servo for something. One reply frame.
    Read,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Command {
    MoveTimeWrite = 1,
    MoveTimeRead = 2,
    MoveTimeWaitWrite = 7,
    MoveTimeWaitRead = 8,
    MoveStart = 11,
    MoveStop = 12,
    IdWrite = 13,
    IdRead = 14,
    AngleOffsetAdjust = 17,
    AngleOffsetWrite = 18,
    AngleOffsetRead = 19,
    AngleLimitWrite = 20,
    AngleLimitRead = 21,
    VinLimitWrite = 22,
    VinLimitRead = 23,
    TempMaxLimitWrite = 24,
    TempMaxLimitRead = 25,
    TempRead = 26,
    VinRead = 27,
    PosRead = 28,
    MotorModeWrite = 29,
    MotorModeRead = 30,
    LoadWrite = 31,
    LoadRead = 32,
    LedWrite = 33,
    LedRead = 34,
    LedErrorWrite = 35,
    LedErrorRead = 36,
}

impl Command {
    /// The full catalog in opcode order.
    pub const ALL: [Command; 28] = [
        Command::MoveTimeWrite,
        Command::MoveTimeRead,
        Command::MoveTimeWaitWrite,
        Command::MoveTimeWaitRead,
        Command::MoveStart,
        Command::MoveStop,
        Command::IdWrite,
        Command::IdRead,
        Command::AngleOffsetAdjust,
        Command::AngleOffsetWrite,
        Command::AngleOffsetRead,
        Command::AngleLimitWrite,
        Command::AngleLimitRead,
        Command::VinLimitWrite,
        Command::VinLimitRead,
        Command::TempMaxLimitWrite,
        Command::TempMaxLimitRead,
        Command::TempRead,
        Command::VinRead,
        Command::PosRead,
        Command::MotorModeWrite,
        Command::MotorModeRead,
        Command::LoadWrite,
        Command::LoadRead,
        Command::LedWrite,
        Command::LedRead,
        Command::LedErrorWrite,
        Command::LedErrorRead,
    ];

    /// The opcode byte.
    pub const fn opcode(self) -> u8 {
        self as u8
    }

    pub const fn direction(self) -> Direction {
        match self {
            Command::MoveTimeWrite
            | Command::MoveTimeWaitWrite
            | Command::MoveStart
            | Command::MoveStop
            | Command::IdWrite
            | Command::AngleOffsetAdjust
            | Command::AngleOffsetWrite
            | Command::AngleLimitWrite
            | Command::VinLimitWrite
            | Command::TempMaxLimitWrite
            | Command::MotorModeWrite
            | Command::LoadWrite
            | Command::LedWrite
            | Command::LedErrorWrite => Direction::Write,
            _ => Direction::Read,
        }
    }

    /// Payload bytes the host sends with this command.
    pub const fn request_payload_len(self) -> usize {
        match self {
            Command::MoveTimeWrite
            | Command::MoveTimeWaitWrite
            | Command::AngleLimitWrite
            | Command::VinLimitWrite
            | Command::MotorModeWrite => 4,
            Command::IdWrite
            | Command::AngleOffsetAdjust
            | Command::TempMaxLimitWrite
            | Command::LoadWrite
            | Command::LedWrite
            | Command::LedErrorWrite => 1,
            _ => 0,
        }
    }

    /// Payload bytes in the reply to this command; `None` for writes.
    pub const fn response_payload_len(self) -> Option<usize> {
        match self {
            Command::MoveTimeRead
            | Command::MoveTimeWaitRead
            | Command::AngleLimitRead
            | Command::VinLimitRead
            | Command::MotorModeRead => Some(4),
            Command::VinRead | Command::PosRead => Some(2),
            Command::IdRead
            | Command::AngleOffsetRead
            | Command::TempMaxLimitRead
            | Command::TempRead
            | Command::LoadRead
            | Command::LedRead
            | Command::LedErrorRead => Some(1),
            _ => None,
        }
    }

    /// Value of the frame length byte for a request of this command.
    pub const fn request_length_byte(self) -> u8 {
        self.request_payload_len() as u8 + 3
    }

    /// Whether the servo answers this command.
    pub const fn expects_reply(self) -> bool {
        matches!(self.direction(), Direction::Read)
    }

    /// Protocol name of the command, e.g. `SERVO_MOVE_TIME_WRITE`.
    pub const fn name(self) -> &'static str {
        match self {
            Command::MoveTimeWrite => "SERVO_MOVE_TIME_WRITE",
            Command::MoveTimeRead => "SERVO_MOVE_TIME_READ",
            Command::MoveTimeWaitWrite => "SERVO_MOVE_TIME_WAIT_WRITE",
            Command::MoveTimeWaitRead => "SERVO_MOVE_TIME_WAIT_READ",
            Command::MoveStart => "SERVO_MOVE_START",
            Command::MoveStop => "SERVO_MOVE_STOP",
            Command::IdWrite => "SERVO_ID_WRITE",
            Command::IdRead => "SERVO_ID_READ",
            Command::AngleOffsetAdjust => "SERVO_ANGLE_OFFSET_ADJUST",
            Command::AngleOffsetWrite => "SERVO_ANGLE_OFFSET_WRITE",
            Command::AngleOffsetRead => "SERVO_ANGLE_OFFSET_READ",
            Command::AngleLimitWrite => "SERVO_ANGLE_LIMIT_WRITE",
            Command::AngleLimitRead => "SERVO_ANGLE_LIMIT_READ",
            Command::VinLimitWrite => "SERVO_VIN_LIMIT_WRITE",
            Command::VinLimitRead => "SERVO_VIN_LIMIT_READ",
            Command::TempMaxLimitWrite => "SERVO_TEMP_MAX_LIMIT_WRITE",
            Command::TempMaxLimitRead => "SERVO_TEMP_MAX_LIMIT_READ",
            Command::TempRead => "SERVO_TEMP_READ",
            Command::VinRead => "SERVO_VIN_READ",
            Command::PosRead => "SERVO_POS_READ",
            Command::MotorModeWrite => "SERVO_OR_MOTOR_MODE_WRITE",
            Command::MotorModeRead => "SERVO_OR_MOTOR_MODE_READ",
            Command::LoadWrite => "SERVO_LOAD_OR_UNLOAD_WRITE",
            Command::LoadRead => "SERVO_LOAD_OR_UNLOAD_READ",
            Command::LedWrite => "SERVO_LED_CTRL_WRITE",
            Command::LedRead => "SERVO_LED_CTRL_READ",
            Command::LedErrorWrite => "SERVO_LED_ERROR_WRITE",
            Command::LedErrorRead => "SERVO_LED_ERROR_READ",
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = FrameError;

    fn try_from(opcode: u8) -> Result<Self, Self::Error> {
        Command::ALL
            .iter()
            .copied()
            .find(|command| command.opcode() == opcode)
            .ok_or(FrameError::UnknownCommand(opcode))
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command.opcode()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.opcode())
    }
}
