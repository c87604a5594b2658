use std::time::Duration;

use clap::{ArgGroup, Args, Subcommand};
use htsbus_servo::{BusConfig, ServoBus, ServoId};
use htsbus_transport::SerialConfig;

use crate::exit::{range_error, servo_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod motion;
pub mod set_id;
pub mod status;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read position, temperature, voltage and mode of one servo.
    Status(StatusArgs),
    /// Move a servo to a position over a duration.
    Move(MoveArgs),
    /// Start moves stored with `move --wait`.
    Start(TargetArgs),
    /// Stop the current move.
    Stop(TargetArgs),
    /// Assign a new id.
    SetId(SetIdArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Serial line options shared by every command that talks to servos.
#[derive(Debug, Clone)]
pub struct LineOptions {
    pub serial: SerialConfig,
}

impl LineOptions {
    /// Open the line. The reply wait uses the same bound as serial reads.
    pub fn open(&self) -> CliResult<ServoBus> {
        let mut bus = ServoBus::with_config(BusConfig {
            response_timeout: Some(self.serial.timeout),
            ..BusConfig::default()
        });
        bus.connect(&self.serial)
            .map_err(|err| servo_error(&format!("cannot open {}", self.serial.path), err))?;
        Ok(bus)
    }
}

pub fn run(command: Command, line: &LineOptions, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Status(args) => status::run(args, line, format),
        Command::Move(args) => motion::run_move(args, line, format),
        Command::Start(args) => motion::run_start(args, line, format),
        Command::Stop(args) => motion::run_stop(args, line, format),
        Command::SetId(args) => set_id::run(args, line, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Servo id (0-253, or 254 for the only servo on the line).
    pub id: u8,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["degree", "position"])))]
pub struct MoveArgs {
    /// Servo id (0-253, or 254 for every servo).
    pub id: u8,
    /// Target angle in degrees (0-240).
    #[arg(long, allow_negative_numbers = true)]
    pub degree: Option<f64>,
    /// Target position in units (0-1000).
    #[arg(long)]
    pub position: Option<u16>,
    /// Move duration in milliseconds (0-30000).
    #[arg(long, default_value_t = 1000)]
    pub time: u16,
    /// Store the move; run it later with `start`.
    #[arg(long)]
    pub wait: bool,
}

#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Servo id. Default: every servo.
    #[arg(default_value_t = ServoId::BROADCAST.get())]
    pub id: u8,
}

#[derive(Args, Debug)]
pub struct SetIdArgs {
    /// New id (0-253).
    pub new_id: u8,
    /// Current id. Default: broadcast, which renumbers every servo on the line.
    #[arg(long, default_value_t = ServoId::BROADCAST.get())]
    pub id: u8,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn servo_id(raw: u8) -> CliResult<ServoId> {
    ServoId::new(raw).map_err(|err| range_error("invalid servo id", err))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(number) => (number, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
    }

    #[test]
    fn parse_duration_invalid() {
        assert_eq!(parse_duration("0ms").unwrap_err().code, USAGE);
        assert_eq!(parse_duration("soon").unwrap_err().code, USAGE);
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }

    #[test]
    fn servo_id_rejects_255() {
        assert_eq!(servo_id(255).unwrap_err().code, USAGE);
        assert!(servo_id(254).unwrap().is_broadcast());
    }
}
