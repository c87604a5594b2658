//! Driver for HTS serial-bus servos (LX-16A and compatible).
//!
//! Servos share one half-duplex serial line and answer framed commands
//! addressed by id. This crate re-exports the layers of the driver.
//!
//! # Crate Structure
//!
//! - [`transport`]: the serial line abstraction and an in-memory fake
//! - [`frame`]: wire framing, the command catalog, parameter encoding
//! - [`servo`]: the request/reply engine and typed device API (behind the
//!   `servo` feature, on by default)

/// Re-export transport types.
pub mod transport {
    pub use htsbus_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use htsbus_frame::*;
}

/// Re-export servo types (requires `servo` feature).
#[cfg(feature = "servo")]
pub mod servo {
    pub use htsbus_servo::*;
}
