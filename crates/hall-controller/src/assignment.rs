//! Participant to room assignment.
//!
//! The orchestrator only needs a complete mapping from participant to room
//! before any task is spawned. How it is produced (computed in-process,
//! deserialized from a file, received from another process) is up to the
//! [`AssignmentSource`] implementation.

use common::types::{ParticipantId, RoomId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::HcError;

/// A participant and the room it was assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub assigned_room: RoomId,
}

/// Produces the participant to room mapping for an event.
pub trait AssignmentSource: Send + Sync {
    /// Assign `participants` participants to rooms of `capacity` seats.
    fn assign(&self, participants: u32, capacity: u32) -> Result<Assignment, HcError>;
}

/// Contiguous block allocation: participant `i` sits in room `i / block`.
///
/// The block size defaults to the room capacity. Overriding it reproduces a
/// misconfigured source that packs more participants into a room than it
/// has seats.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockAssignment {
    block_size: Option<u32>,
}

impl BlockAssignment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed block size instead of the room capacity.
    #[must_use]
    pub fn with_block_size(block_size: u32) -> Self {
        Self {
            block_size: Some(block_size),
        }
    }
}

impl AssignmentSource for BlockAssignment {
    fn assign(&self, participants: u32, capacity: u32) -> Result<Assignment, HcError> {
        let block = self.block_size.unwrap_or(capacity);
        if block == 0 {
            return Err(HcError::Config("assignment block size must be >= 1".to_string()));
        }

        Ok(Assignment::from_rooms(
            (0..participants).map(|i| RoomId(i / block)).collect(),
        ))
    }
}

/// Immutable participant to room mapping, indexed by participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    rooms: Vec<RoomId>,
}

impl Assignment {
    /// Build a mapping where `rooms[i]` is the room of participant `i`.
    #[must_use]
    pub fn from_rooms(rooms: Vec<RoomId>) -> Self {
        Self { rooms }
    }

    /// Room assigned to `participant`, if the participant exists.
    #[must_use]
    pub fn room_of(&self, participant: ParticipantId) -> Option<RoomId> {
        self.rooms.get(participant.index()).copied()
    }

    /// Number of participants in the mapping.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Iterate over every participant in id order.
    pub fn participants(&self) -> impl Iterator<Item = Participant> + '_ {
        self.rooms.iter().zip(0u32..).map(|(&room, id)| Participant {
            id: ParticipantId(id),
            assigned_room: room,
        })
    }

    /// Expected attendance per room if every participant is admitted.
    #[must_use]
    pub fn occupancy(&self) -> BTreeMap<RoomId, u32> {
        let mut occupancy = BTreeMap::new();
        for room in &self.rooms {
            *occupancy.entry(*room).or_insert(0) += 1;
        }
        occupancy
    }

    /// Check the mapping covers exactly `participants` participants and only
    /// references rooms below `room_count`.
    pub fn validate(&self, participants: u32, room_count: u32) -> Result<(), HcError> {
        if self.rooms.len() != participants as usize {
            return Err(HcError::Config(format!(
                "assignment covers {} participants, expected {participants}",
                self.rooms.len()
            )));
        }

        if let Some(participant) = self.participants().find(|p| p.assigned_room.0 >= room_count) {
            return Err(HcError::Config(format!(
                "participant {} assigned to room {} but only {room_count} rooms exist",
                participant.id, participant.assigned_room
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_block_assignment_is_contiguous() {
        let assignment = BlockAssignment::new().assign(300, 30).unwrap();

        assert_eq!(assignment.len(), 300);
        assert_eq!(assignment.room_of(ParticipantId(0)), Some(RoomId(0)));
        assert_eq!(assignment.room_of(ParticipantId(29)), Some(RoomId(0)));
        assert_eq!(assignment.room_of(ParticipantId(30)), Some(RoomId(1)));
        assert_eq!(assignment.room_of(ParticipantId(299)), Some(RoomId(9)));
        assert_eq!(assignment.room_of(ParticipantId(300)), None);
    }

    #[test]
    fn test_partial_last_block() {
        let assignment = BlockAssignment::new().assign(301, 30).unwrap();
        let occupancy = assignment.occupancy();

        assert_eq!(occupancy.len(), 11);
        assert!(occupancy.range(RoomId(0)..RoomId(10)).all(|(_, &n)| n == 30));
        assert_eq!(occupancy.get(&RoomId(10)), Some(&1));
    }

    #[test]
    fn test_block_size_override_overfills_rooms() {
        let assignment = BlockAssignment::with_block_size(35).assign(35, 30).unwrap();

        assert_eq!(assignment.occupancy().get(&RoomId(0)), Some(&35));
        assert!(assignment.validate(35, 2).is_ok());
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let result = BlockAssignment::with_block_size(0).assign(10, 5);
        assert!(matches!(result, Err(HcError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_room() {
        let assignment = BlockAssignment::with_block_size(10).assign(300, 30).unwrap();

        // 300 participants in blocks of 10 need 30 rooms, not 10
        let result = assignment.validate(300, 10);
        assert!(matches!(result, Err(HcError::Config(msg)) if msg.contains("room 10")));
    }

    #[test]
    fn test_validate_rejects_incomplete_mapping() {
        let assignment = Assignment::from_rooms(vec![RoomId(0); 5]);
        assert!(matches!(assignment.validate(6, 1), Err(HcError::Config(_))));
    }

    #[test]
    fn test_participants_iterate_in_id_order() {
        let assignment = Assignment::from_rooms(vec![RoomId(1), RoomId(0), RoomId(1)]);
        let participants: Vec<_> = assignment.participants().collect();

        assert_eq!(
            participants,
            vec![
                Participant {
                    id: ParticipantId(0),
                    assigned_room: RoomId(1)
                },
                Participant {
                    id: ParticipantId(1),
                    assigned_room: RoomId(0)
                },
                Participant {
                    id: ParticipantId(2),
                    assigned_room: RoomId(1)
                },
            ]
        );
    }
}
