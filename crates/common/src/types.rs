//! Common data types for Hall Controller components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a participant.
///
/// Participants are numbered by their 0-based position in the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub u32);

impl ParticipantId {
    /// Position of this participant in the population.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ParticipantId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Identifier for a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomId(pub u32);

impl RoomId {
    /// Position of this room in the registry.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RoomId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_display_as_plain_numbers() {
        assert_eq!(ParticipantId(17).to_string(), "17");
        assert_eq!(RoomId(3).to_string(), "3");
    }

    #[test]
    fn test_ids_serialize_transparently_as_tuples() {
        let json = serde_json::to_string(&(ParticipantId(4), RoomId(0))).unwrap();
        assert_eq!(json, "[4,0]");

        let (participant, room): (ParticipantId, RoomId) = serde_json::from_str("[9,2]").unwrap();
        assert_eq!(participant, ParticipantId(9));
        assert_eq!(room, RoomId(2));
    }

    #[test]
    fn test_index_matches_inner_value() {
        assert_eq!(ParticipantId(299).index(), 299);
        assert_eq!(RoomId::from(9).index(), 9);
    }
}
