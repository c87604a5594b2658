use htsbus_frame::param::check_range;
use htsbus_servo::ServoId;

use crate::cmd::{servo_id, LineOptions, SetIdArgs};
use crate::exit::{range_error, servo_error, CliResult, SUCCESS};
use crate::output::{print_action, ActionOutput, OutputFormat};

pub fn run(args: SetIdArgs, line: &LineOptions, format: OutputFormat) -> CliResult<i32> {
    let id = servo_id(args.id)?;
    check_range("new id", args.new_id, 0, ServoId::MAX_INDIVIDUAL)
        .map_err(|err| range_error("invalid new id", err))?;

    let mut bus = line.open()?;
    let advisory = bus
        .set_id(args.new_id, id)
        .map_err(|err| servo_error(&format!("set-id on servo {id} failed"), err))?;

    print_action(
        &ActionOutput {
            action: "set-id",
            id: id.to_string(),
            detail: format!("new_id={}", args.new_id),
            advisory,
        },
        format,
    );
    Ok(SUCCESS)
}
