mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use htsbus_transport::{SerialConfig, DEFAULT_BAUD_RATE};

use crate::cmd::{parse_duration, Command, LineOptions};
use crate::exit::{CliResult, SUCCESS, USAGE};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "htsbus", version, about = "HTS serial-bus servo CLI")]
struct Cli {
    /// Serial device the servos are attached to.
    #[arg(
        long,
        value_name = "PATH",
        env = "HTSBUS_PORT",
        default_value = "/dev/ttyUSB0",
        global = true
    )]
    port: String,

    /// Line speed in baud.
    #[arg(long, value_name = "BAUD", default_value_t = DEFAULT_BAUD_RATE, global = true)]
    baud: u32,

    /// Line and reply timeout (e.g. 1s, 250ms).
    #[arg(long, value_name = "DURATION", default_value = "1s", global = true)]
    timeout: String,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn line_options(&self) -> CliResult<LineOptions> {
        Ok(LineOptions {
            serial: SerialConfig {
                path: self.port.clone(),
                baud_rate: self.baud,
                timeout: parse_duration(&self.timeout)?,
            },
        })
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version also arrive here and exit cleanly.
            let code = if err.use_stderr() { USAGE } else { SUCCESS };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cli
        .line_options()
        .and_then(|line| cmd::run(cli.command, &line, format));

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn parses_move_with_degree() {
        let cli = Cli::try_parse_from(["htsbus", "move", "1", "--degree", "120", "--time", "500"])
            .expect("move args should parse");

        match cli.command {
            Command::Move(args) => {
                assert_eq!(args.id, 1);
                assert_eq!(args.degree, Some(120.0));
                assert_eq!(args.time, 500);
                assert!(!args.wait);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_degree_with_position() {
        let err = Cli::try_parse_from([
            "htsbus",
            "move",
            "1",
            "--degree",
            "10",
            "--position",
            "40",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn move_requires_a_target() {
        let err = Cli::try_parse_from(["htsbus", "move", "1"]).expect_err("target is required");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn start_defaults_to_broadcast() {
        let cli = Cli::try_parse_from(["htsbus", "start"]).expect("start should parse");
        assert!(matches!(cli.command, Command::Start(args) if args.id == 254));
    }

    #[test]
    fn global_line_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "htsbus",
            "status",
            "3",
            "--port",
            "/dev/ttyACM0",
            "--baud",
            "57600",
            "--timeout",
            "250ms",
        ])
        .expect("status args should parse");

        let line = cli.line_options().unwrap();
        assert_eq!(line.serial.path, "/dev/ttyACM0");
        assert_eq!(line.serial.baud_rate, 57600);
        assert_eq!(line.serial.timeout, Duration::from_millis(250));
    }

    #[test]
    fn set_id_parses_target() {
        let cli = Cli::try_parse_from(["htsbus", "set-id", "7", "--id", "2"])
            .expect("set-id should parse");
        assert!(matches!(
            cli.command,
            Command::SetId(args) if args.new_id == 7 && args.id == 2
        ));
    }
}
