//! Sweep one servo across its travel and print where it ends up.
//!
//! Run with:
//!   cargo run --example sweep -- /dev/ttyUSB0 1

use std::thread;
use std::time::Duration;

use htsbus::servo::{ServoBus, ServoId};
use htsbus::transport::SerialConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let id: u8 = args.next().map(|raw| raw.parse()).transpose()?.unwrap_or(1);

    let mut bus = ServoBus::open(&SerialConfig::new(path))?;
    let servo = ServoId::individual(id)?;

    bus.set_load(true, servo)?;
    for degree in [0.0, 120.0, 240.0, 120.0] {
        bus.move_to_degree(degree, 800, false, servo)?;
        thread::sleep(Duration::from_millis(900));
        eprintln!("target {degree:>5.1}°  position {}", bus.get_pos(servo)?);
    }

    bus.disconnect()?;
    Ok(())
}
