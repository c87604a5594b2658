use std::fmt;

use crate::error::RangeError;

/// Bus address of a servo.
///
/// 0-253 address one servo each; 254 addresses every servo on the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServoId(u8);

impl ServoId {
    /// Highest address an individual servo can hold.
    pub const MAX_INDIVIDUAL: u8 = 253;

    /// Broadcast address (0xFE).
    pub const BROADCAST: ServoId = ServoId(0xFE);

    /// Accepts 0..=254; 254 is the broadcast address.
    pub fn new(id: u8) -> Result<Self, RangeError> {
        if id > Self::BROADCAST.0 {
            return Err(RangeError::new("servo id", id, 0, Self::BROADCAST.0));
        }
        Ok(Self(id))
    }

    /// Accepts 0..=253 only.
    pub fn individual(id: u8) -> Result<Self, RangeError> {
        if id > Self::MAX_INDIVIDUAL {
            return Err(RangeError::new("servo id", id, 0, Self::MAX_INDIVIDUAL));
        }
        Ok(Self(id))
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn is_broadcast(self) -> bool {
        self.0 == Self::BROADCAST.0
    }
}

impl Default for ServoId {
    fn default() -> Self {
        Self::BROADCAST
    }
}

impl TryFrom<u8> for ServoId {
    type Error = RangeError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<ServoId> for u8 {
    fn from(id: ServoId) -> Self {
        id.0
    }
}

impl fmt::Display for ServoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_broadcast() {
            write!(f, "broadcast")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_is_0xfe() {
        assert_eq!(ServoId::BROADCAST.get(), 0xFE);
        assert!(ServoId::BROADCAST.is_broadcast());
        assert!(ServoId::new(254).unwrap().is_broadcast());
        assert_eq!(ServoId::default(), ServoId::BROADCAST);
    }

    #[test]
    fn rejects_255() {
        assert!(ServoId::new(255).is_err());
        assert!(ServoId::try_from(255u8).is_err());
    }

    #[test]
    fn individual_excludes_broadcast() {
        assert_eq!(ServoId::individual(0).unwrap().get(), 0);
        assert_eq!(ServoId::individual(253).unwrap().get(), 253);
        assert!(ServoId::individual(254).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(ServoId::new(7).unwrap().to_string(), "7");
        assert_eq!(ServoId::BROADCAST.to_string(), "broadcast");
    }
}
