use htsbus_frame::param::{check_range, degree_to_command_units, MAX_POSITION};
use htsbus_servo::api::MAX_MOVE_TIME_MS;
use htsbus_servo::ServoId;

use crate::cmd::{servo_id, LineOptions, MoveArgs, TargetArgs};
use crate::exit::{range_error, servo_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_action, ActionOutput, OutputFormat};

pub fn run_move(args: MoveArgs, line: &LineOptions, format: OutputFormat) -> CliResult<i32> {
    let id = servo_id(args.id)?;
    // Arguments are checked before the port is opened.
    let position = target_position(&args)?;
    check_range("time", args.time, 0, MAX_MOVE_TIME_MS)
        .map_err(|err| range_error("invalid --time", err))?;

    let mut bus = line.open()?;
    bus.set_move_time(position, args.time, args.wait, id)
        .map_err(|err| servo_error(&format!("move of servo {id} failed"), err))?;

    let detail = if args.wait {
        format!("position={position} time={}ms (stored, run with start)", args.time)
    } else {
        format!("position={position} time={}ms", args.time)
    };
    print_action(
        &ActionOutput {
            action: "move",
            id: id.to_string(),
            detail,
            advisory: None,
        },
        format,
    );
    Ok(SUCCESS)
}

pub fn run_start(args: TargetArgs, line: &LineOptions, format: OutputFormat) -> CliResult<i32> {
    run_simple("start", args.id, line, format, |bus, id| bus.start_move(id))
}

pub fn run_stop(args: TargetArgs, line: &LineOptions, format: OutputFormat) -> CliResult<i32> {
    run_simple("stop", args.id, line, format, |bus, id| bus.stop_move(id))
}

fn run_simple<F>(
    action: &'static str,
    raw_id: u8,
    line: &LineOptions,
    format: OutputFormat,
    op: F,
) -> CliResult<i32>
where
    F: FnOnce(&mut htsbus_servo::ServoBus, ServoId) -> htsbus_servo::Result<()>,
{
    let id = servo_id(raw_id)?;
    let mut bus = line.open()?;
    op(&mut bus, id).map_err(|err| servo_error(&format!("{action} on servo {id} failed"), err))?;

    print_action(
        &ActionOutput {
            action,
            id: id.to_string(),
            detail: String::new(),
            advisory: None,
        },
        format,
    );
    Ok(SUCCESS)
}

fn target_position(args: &MoveArgs) -> CliResult<u16> {
    match (args.degree, args.position) {
        (Some(degree), None) => {
            degree_to_command_units(degree).map_err(|err| range_error("invalid --degree", err))
        }
        (None, Some(position)) => {
            check_range("position", position, 0, MAX_POSITION)
                .map_err(|err| range_error("invalid --position", err))?;
            Ok(position)
        }
        _ => Err(CliError::new(
            USAGE,
            "exactly one of --degree or --position is required",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(degree: Option<f64>, position: Option<u16>) -> MoveArgs {
        MoveArgs {
            id: 1,
            degree,
            position,
            time: 500,
            wait: false,
        }
    }

    #[test]
    fn degree_target_converted() {
        assert_eq!(target_position(&args(Some(120.0), None)).unwrap(), 500);
    }

    #[test]
    fn out_of_range_targets_are_usage_errors() {
        assert_eq!(
            target_position(&args(Some(241.0), None)).unwrap_err().code,
            USAGE
        );
        assert_eq!(
            target_position(&args(None, Some(1001))).unwrap_err().code,
            USAGE
        );
    }
}
