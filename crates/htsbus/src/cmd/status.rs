use crate::cmd::{servo_id, LineOptions, StatusArgs};
use crate::exit::{servo_error, CliResult, SUCCESS};
use crate::output::{print_status, OutputFormat};

pub fn run(args: StatusArgs, line: &LineOptions, format: OutputFormat) -> CliResult<i32> {
    let id = servo_id(args.id)?;
    let mut bus = line.open()?;

    let status = bus
        .status(id)
        .map_err(|err| servo_error(&format!("status of servo {id} failed"), err))?;

    print_status(&status, &line.serial.path, format);
    Ok(SUCCESS)
}
