//! Typed device operations.
//!
//! Each method checks its arguments before touching the line, so a rejected
//! value never produces a partial frame. Reads return decoded values; the
//! raw payload layout stays inside this module.

use std::fmt;

use bytes::{Bytes, BytesMut};
use htsbus_frame::param::{
    self, check_range, degree_to_command_units, degree_to_offset_units, MAX_OFFSET, MAX_POSITION,
};
use htsbus_frame::{Command, FrameError, ServoId, Width};
use serde::Serialize;
use tracing::warn;

use crate::bus::ServoBus;
use crate::error::{Result, ServoError};

/// Longest accepted move duration in milliseconds.
pub const MAX_MOVE_TIME_MS: u16 = 30_000;
/// Input voltage limit bounds in millivolts.
pub const MIN_VIN_MV: u16 = 4_500;
pub const MAX_VIN_MV: u16 = 12_000;
/// Temperature limit bounds in degrees Celsius.
pub const MIN_TEMP_LIMIT: u8 = 50;
pub const MAX_TEMP_LIMIT: u8 = 100;
/// Motor mode speed bound (either direction).
pub const MAX_MOTOR_SPEED: i16 = 1_000;

/// A stored move: target position and duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoveTime {
    pub position: u16,
    pub time_ms: u16,
}

/// An inclusive `min..=max` pair as stored by the servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Limit {
    pub min: u16,
    pub max: u16,
}

/// Servo (position) mode or continuous rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MotorMode {
    Servo,
    Motor { speed: i16 },
}

/// Fault conditions that make the servo LED flash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedErrorFlags {
    pub over_temperature: bool,
    pub over_voltage: bool,
    pub stalled: bool,
}

impl LedErrorFlags {
    const OVER_TEMPERATURE: u8 = 1 << 0;
    const OVER_VOLTAGE: u8 = 1 << 1;
    const STALLED: u8 = 1 << 2;

    pub const fn all() -> Self {
        Self {
            over_temperature: true,
            over_voltage: true,
            stalled: true,
        }
    }

    pub const fn bits(self) -> u8 {
        let mut bits = 0;
        if self.over_temperature {
            bits |= Self::OVER_TEMPERATURE;
        }
        if self.over_voltage {
            bits |= Self::OVER_VOLTAGE;
        }
        if self.stalled {
            bits |= Self::STALLED;
        }
        bits
    }

    /// Unknown high bits are ignored.
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            over_temperature: bits & Self::OVER_TEMPERATURE != 0,
            over_voltage: bits & Self::OVER_VOLTAGE != 0,
            stalled: bits & Self::STALLED != 0,
        }
    }
}

/// A non-error note returned alongside a successful operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// An id write went to the broadcast address and renumbered every servo
    /// on the line.
    BroadcastIdWrite { new_id: u8 },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::BroadcastIdWrite { new_id } => write!(
                f,
                "id write sent to broadcast: every servo on the line now has id {new_id}"
            ),
        }
    }
}

/// One snapshot of a servo's readable state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServoStatus {
    pub id: u8,
    pub position: i16,
    pub degree: f64,
    pub temperature_c: u8,
    pub voltage_mv: u16,
    pub angle_offset: i8,
    pub loaded: bool,
    pub led_on: bool,
    pub motor_mode: MotorMode,
    pub led_error: LedErrorFlags,
}

impl ServoBus {
    /// Move to `position` (0..=1000) over `time_ms` (0..=30000).
    ///
    /// With `wait` the move is stored and only starts on
    /// [`start_move`](Self::start_move).
    pub fn set_move_time(
        &mut self,
        position: u16,
        time_ms: u16,
        wait: bool,
        id: ServoId,
    ) -> Result<()> {
        check_range("position", position, 0, MAX_POSITION)?;
        check_range("time", time_ms, 0, MAX_MOVE_TIME_MS)?;

        let mut payload = BytesMut::with_capacity(4);
        param::encode_into(i32::from(position), Width::Word, false, &mut payload)?;
        param::encode_into(i32::from(time_ms), Width::Word, false, &mut payload)?;

        let command = if wait {
            Command::MoveTimeWaitWrite
        } else {
            Command::MoveTimeWrite
        };
        self.write(id, command, &payload)
    }

    /// [`set_move_time`](Self::set_move_time) with the target in degrees
    /// (0..=240).
    pub fn move_to_degree(
        &mut self,
        degree: f64,
        time_ms: u16,
        wait: bool,
        id: ServoId,
    ) -> Result<()> {
        let position = degree_to_command_units(degree)?;
        self.set_move_time(position, time_ms, wait, id)
    }

    pub fn get_move_time(&mut self, wait: bool, id: ServoId) -> Result<MoveTime> {
        let command = if wait {
            Command::MoveTimeWaitRead
        } else {
            Command::MoveTimeRead
        };
        let reply = self.read(id, command)?;
        Ok(MoveTime {
            position: unsigned_word(command, &reply, 0)?,
            time_ms: unsigned_word(command, &reply, 2)?,
        })
    }

    /// Start a move stored with `wait`.
    pub fn start_move(&mut self, id: ServoId) -> Result<()> {
        self.write(id, Command::MoveStart, &[])
    }

    pub fn stop_move(&mut self, id: ServoId) -> Result<()> {
        self.write(id, Command::MoveStop, &[])
    }

    /// Give the servo at `id` the new id `new_id` (0..=253).
    ///
    /// Sending this to broadcast renumbers every servo on the line. The write
    /// still goes out, and the caller gets an [`Advisory`] back.
    pub fn set_id(&mut self, new_id: u8, id: ServoId) -> Result<Option<Advisory>> {
        check_range("id", new_id, 0, ServoId::MAX_INDIVIDUAL)?;

        let advisory = if id.is_broadcast() {
            warn!(new_id, "id write to broadcast renumbers every servo on the line");
            Some(Advisory::BroadcastIdWrite { new_id })
        } else {
            None
        };

        self.write(id, Command::IdWrite, &[new_id])?;
        Ok(advisory)
    }

    /// Read the id. Sent to broadcast, this finds the id of a lone servo.
    pub fn get_id(&mut self, id: ServoId) -> Result<ServoId> {
        let reply = self.read(id, Command::IdRead)?;
        let raw = unsigned_byte(Command::IdRead, &reply, 0)?;
        ServoId::new(raw).map_err(|err| ServoError::from_frame(Some(Command::IdRead), err.into()))
    }

    /// Adjust the angle offset (-125..=125 units, about ±30°).
    ///
    /// The adjustment is lost on power-off unless `persistent`, which follows
    /// it with a save to the servo's memory.
    pub fn set_angle_offset(&mut self, offset: i8, persistent: bool, id: ServoId) -> Result<()> {
        check_range("angle offset", offset, -MAX_OFFSET, MAX_OFFSET)?;

        let payload = param::encode(i32::from(offset), Width::Byte, true)?;
        self.write(id, Command::AngleOffsetAdjust, &payload)?;
        if persistent {
            self.write(id, Command::AngleOffsetWrite, &[])?;
        }
        Ok(())
    }

    /// [`set_angle_offset`](Self::set_angle_offset) in degrees (-30..=30).
    pub fn set_angle_offset_degree(
        &mut self,
        degree: f64,
        persistent: bool,
        id: ServoId,
    ) -> Result<()> {
        let offset = degree_to_offset_units(degree)?;
        self.set_angle_offset(offset, persistent, id)
    }

    pub fn get_angle_offset(&mut self, id: ServoId) -> Result<i8> {
        let reply = self.read(id, Command::AngleOffsetRead)?;
        let value = field(Command::AngleOffsetRead, &reply, 0, Width::Byte, true)?;
        // Signed byte decode, always within i8.
        Ok(value as i8)
    }

    /// Limit travel to `min..=max` position units (each 0..=1000).
    pub fn set_angle_limit(&mut self, min: u16, max: u16, id: ServoId) -> Result<()> {
        check_range("min angle", min, 0, MAX_POSITION)?;
        check_range("max angle", max, 0, MAX_POSITION)?;
        self.write_pair(id, Command::AngleLimitWrite, min, max)
    }

    pub fn get_angle_limit(&mut self, id: ServoId) -> Result<Limit> {
        self.read_pair(id, Command::AngleLimitRead)
    }

    /// Input voltage alarm window in millivolts (each 4500..=12000).
    pub fn set_vin_limit(&mut self, min_mv: u16, max_mv: u16, id: ServoId) -> Result<()> {
        check_range("min vin", min_mv, MIN_VIN_MV, MAX_VIN_MV)?;
        check_range("max vin", max_mv, MIN_VIN_MV, MAX_VIN_MV)?;
        self.write_pair(id, Command::VinLimitWrite, min_mv, max_mv)
    }

    pub fn get_vin_limit(&mut self, id: ServoId) -> Result<Limit> {
        self.read_pair(id, Command::VinLimitRead)
    }

    /// Over-temperature alarm threshold in °C (50..=100).
    pub fn set_max_temp_limit(&mut self, max_c: u8, id: ServoId) -> Result<()> {
        check_range("max temperature", max_c, MIN_TEMP_LIMIT, MAX_TEMP_LIMIT)?;
        self.write(id, Command::TempMaxLimitWrite, &[max_c])
    }

    pub fn get_max_temp_limit(&mut self, id: ServoId) -> Result<u8> {
        let reply = self.read(id, Command::TempMaxLimitRead)?;
        unsigned_byte(Command::TempMaxLimitRead, &reply, 0)
    }

    /// Internal temperature in °C.
    pub fn get_temp(&mut self, id: ServoId) -> Result<u8> {
        let reply = self.read(id, Command::TempRead)?;
        unsigned_byte(Command::TempRead, &reply, 0)
    }

    /// Input voltage in millivolts.
    pub fn get_vin(&mut self, id: ServoId) -> Result<u16> {
        let reply = self.read(id, Command::VinRead)?;
        unsigned_word(Command::VinRead, &reply, 0)
    }

    /// Current position in units. Can go slightly negative near the end stop.
    pub fn get_pos(&mut self, id: ServoId) -> Result<i16> {
        let reply = self.read(id, Command::PosRead)?;
        let value = field(Command::PosRead, &reply, 0, Width::Word, true)?;
        // Signed word decode, always within i16.
        Ok(value as i16)
    }

    /// `None` selects servo mode; `Some(speed)` selects continuous rotation at
    /// `speed` (-1000..=1000, sign is direction).
    pub fn set_motor_mode(&mut self, speed: Option<i16>, id: ServoId) -> Result<()> {
        let mut payload = BytesMut::with_capacity(4);
        match speed {
            None => payload.extend_from_slice(&[0, 0, 0, 0]),
            Some(speed) => {
                check_range("motor speed", speed, -MAX_MOTOR_SPEED, MAX_MOTOR_SPEED)?;
                payload.extend_from_slice(&[1, 0]);
                param::encode_into(i32::from(speed), Width::Word, true, &mut payload)?;
            }
        }
        self.write(id, Command::MotorModeWrite, &payload)
    }

    pub fn get_motor_mode(&mut self, id: ServoId) -> Result<MotorMode> {
        let command = Command::MotorModeRead;
        let reply = self.read(id, command)?;
        if unsigned_byte(command, &reply, 0)? == 0 {
            return Ok(MotorMode::Servo);
        }
        let speed = field(command, &reply, 2, Width::Word, true)?;
        // Signed word decode, always within i16.
        Ok(MotorMode::Motor {
            speed: speed as i16,
        })
    }

    /// Power the motor (`true`) or let the output shaft turn freely.
    pub fn set_load(&mut self, loaded: bool, id: ServoId) -> Result<()> {
        self.write(id, Command::LoadWrite, &[u8::from(loaded)])
    }

    pub fn get_load(&mut self, id: ServoId) -> Result<bool> {
        let reply = self.read(id, Command::LoadRead)?;
        Ok(unsigned_byte(Command::LoadRead, &reply, 0)? != 0)
    }

    /// The device stores the LED state inverted: 0 is on, 1 is off.
    pub fn set_led(&mut self, on: bool, id: ServoId) -> Result<()> {
        self.write(id, Command::LedWrite, &[u8::from(!on)])
    }

    pub fn get_led(&mut self, id: ServoId) -> Result<bool> {
        let reply = self.read(id, Command::LedRead)?;
        Ok(unsigned_byte(Command::LedRead, &reply, 0)? == 0)
    }

    pub fn set_led_error(&mut self, flags: LedErrorFlags, id: ServoId) -> Result<()> {
        self.write(id, Command::LedErrorWrite, &[flags.bits()])
    }

    pub fn get_led_error(&mut self, id: ServoId) -> Result<LedErrorFlags> {
        let reply = self.read(id, Command::LedErrorRead)?;
        Ok(LedErrorFlags::from_bits(unsigned_byte(
            Command::LedErrorRead,
            &reply,
            0,
        )?))
    }

    /// Read everything a status display needs, one transaction per field.
    pub fn status(&mut self, id: ServoId) -> Result<ServoStatus> {
        let position = self.get_pos(id)?;
        Ok(ServoStatus {
            id: id.get(),
            position,
            degree: param::command_units_to_degree(i32::from(position)),
            temperature_c: self.get_temp(id)?,
            voltage_mv: self.get_vin(id)?,
            angle_offset: self.get_angle_offset(id)?,
            loaded: self.get_load(id)?,
            led_on: self.get_led(id)?,
            motor_mode: self.get_motor_mode(id)?,
            led_error: self.get_led_error(id)?,
        })
    }

    fn write(&mut self, id: ServoId, command: Command, payload: &[u8]) -> Result<()> {
        self.transact(id, command, payload)?;
        Ok(())
    }

    fn read(&mut self, id: ServoId, command: Command) -> Result<Bytes> {
        self.transact(id, command, &[])
    }

    fn write_pair(&mut self, id: ServoId, command: Command, first: u16, second: u16) -> Result<()> {
        let mut payload = BytesMut::with_capacity(4);
        param::encode_into(i32::from(first), Width::Word, false, &mut payload)?;
        param::encode_into(i32::from(second), Width::Word, false, &mut payload)?;
        self.write(id, command, &payload)
    }

    fn read_pair(&mut self, id: ServoId, command: Command) -> Result<Limit> {
        let reply = self.read(id, command)?;
        Ok(Limit {
            min: unsigned_word(command, &reply, 0)?,
            max: unsigned_word(command, &reply, 2)?,
        })
    }
}

fn field(command: Command, payload: &[u8], at: usize, width: Width, signed: bool) -> Result<i32> {
    let raw = payload.get(at..at + width.bytes()).unwrap_or_default();
    param::decode(raw, signed).map_err(|err| ServoError::from_frame(Some(command), err))
}

fn unsigned_byte(command: Command, payload: &[u8], at: usize) -> Result<u8> {
    let value = field(command, payload, at, Width::Byte, false)?;
    u8::try_from(value).map_err(|_| out_of_width(command, value))
}

fn unsigned_word(command: Command, payload: &[u8], at: usize) -> Result<u16> {
    let value = field(command, payload, at, Width::Word, false)?;
    u16::try_from(value).map_err(|_| out_of_width(command, value))
}

fn out_of_width(command: Command, value: i32) -> ServoError {
    ServoError::from_frame(
        Some(command),
        FrameError::Range(htsbus_frame::RangeError::new(
            "reply field",
            value,
            0,
            i32::from(u16::MAX),
        )),
    )
}
