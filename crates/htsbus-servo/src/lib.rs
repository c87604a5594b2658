//! Transaction engine and typed device API for HTS serial-bus servos.
//!
//! [`ServoBus`] owns the line and runs one request/reply transaction at a
//! time. The device operations (moves, ids, limits, readings, LEDs) are
//! methods on the bus; see the [`api`] module for their result types.
//!
//! ```no_run
//! use htsbus_servo::{ServoBus, ServoId};
//! use htsbus_transport::SerialConfig;
//!
//! let mut bus = ServoBus::open(&SerialConfig::new("/dev/ttyUSB0"))?;
//! let servo = ServoId::individual(1)?;
//! bus.move_to_degree(120.0, 500, false, servo)?;
//! println!("{}", bus.get_pos(servo)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod api;
pub mod bus;
pub mod config;
pub mod error;

pub use api::{Advisory, LedErrorFlags, Limit, MotorMode, MoveTime, ServoStatus};
pub use bus::ServoBus;
pub use config::{BusConfig, DEFAULT_POLL_INTERVAL};
pub use error::{Result, ServoError};
pub use htsbus_frame::{Command, ServoId};
