//! Room registry: per-room capacity and live attendance counters.
//!
//! Each room's counter sits behind its own mutex, so admissions into the same
//! room are serialized while different rooms proceed in parallel. The
//! over-capacity flag is computed under the same lock as the increment.
//!
//! Admission never blocks or rejects on a full room. Going over capacity is
//! reported on the returned [`Admission`] and nothing else.

use common::types::{ParticipantId, RoomId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::trace;

use crate::errors::{HcError, SyncMisuse};

/// Static room configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub capacity: u32,
}

/// Result of a single admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub participant: ParticipantId,
    pub room: RoomId,
    /// Attendance count including this admission.
    pub count: u32,
    pub capacity: u32,
    /// `count > capacity` at the moment of this admission.
    pub over_capacity: bool,
}

impl Admission {
    /// How far over capacity the room was after this admission.
    #[must_use]
    pub fn over_by(&self) -> u32 {
        self.count.saturating_sub(self.capacity)
    }
}

#[derive(Debug, Default)]
struct Attendance {
    count: u32,
    /// Participants in admission order.
    admitted: Vec<ParticipantId>,
}

#[derive(Debug)]
struct RoomSlot {
    room: Room,
    attendance: Mutex<Attendance>,
}

/// Owns every room's attendance counter.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: Vec<RoomSlot>,
    /// One flag per participant, set on first admission.
    claimed: Vec<AtomicBool>,
}

impl RoomRegistry {
    /// Create `room_count` rooms of equal `capacity` for a population of
    /// `participants`.
    #[must_use]
    pub fn new(room_count: u32, capacity: u32, participants: u32) -> Self {
        Self::with_rooms(
            (0..room_count)
                .map(|id| Room {
                    id: RoomId(id),
                    capacity,
                })
                .collect(),
            participants,
        )
    }

    /// Create a registry from explicit rooms. Room ids must equal their
    /// position in `rooms`.
    #[must_use]
    pub fn with_rooms(rooms: Vec<Room>, participants: u32) -> Self {
        Self {
            rooms: rooms
                .into_iter()
                .map(|room| RoomSlot {
                    room,
                    attendance: Mutex::new(Attendance::default()),
                })
                .collect(),
            claimed: (0..participants).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    /// Record `participant` entering `room`.
    ///
    /// # Errors
    ///
    /// - `UnknownRoom` if the registry does not hold `room`
    /// - `Misuse(DuplicateAdmission)` if the participant was already admitted
    /// - `Internal` if the participant is outside the population or a room
    ///   lock is poisoned
    pub fn admit(&self, room: RoomId, participant: ParticipantId) -> Result<Admission, HcError> {
        let slot = self.slot(room)?;

        let claim = self.claimed.get(participant.index()).ok_or_else(|| {
            HcError::Internal(format!("participant {participant} outside population"))
        })?;
        if claim.swap(true, Ordering::AcqRel) {
            return Err(SyncMisuse::DuplicateAdmission { participant, room }.into());
        }

        let mut attendance = lock(&slot.attendance)?;
        attendance.count += 1;
        attendance.admitted.push(participant);

        let admission = Admission {
            participant,
            room,
            count: attendance.count,
            capacity: slot.room.capacity,
            over_capacity: attendance.count > slot.room.capacity,
        };
        drop(attendance);

        trace!(
            target: "hc.registry",
            room = %room,
            participant = %participant,
            count = admission.count,
            "Admission recorded"
        );

        Ok(admission)
    }

    /// Attendance count for `room`.
    ///
    /// Intended for the summary, once every participant task has joined.
    pub fn final_count(&self, room: RoomId) -> Result<u32, HcError> {
        Ok(lock(&self.slot(room)?.attendance)?.count)
    }

    /// Participants admitted to `room`, in admission order.
    pub fn admitted(&self, room: RoomId) -> Result<Vec<ParticipantId>, HcError> {
        Ok(lock(&self.slot(room)?.attendance)?.admitted.clone())
    }

    /// Static configuration of every room, in id order.
    pub fn rooms(&self) -> impl Iterator<Item = Room> + '_ {
        self.rooms.iter().map(|slot| slot.room)
    }

    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn slot(&self, room: RoomId) -> Result<&RoomSlot, HcError> {
        self.rooms
            .get(room.index())
            .ok_or(HcError::UnknownRoom(room))
    }
}

fn lock(attendance: &Mutex<Attendance>) -> Result<MutexGuard<'_, Attendance>, HcError> {
    attendance
        .lock()
        .map_err(|_| HcError::Internal("room attendance lock poisoned".to_string()))
}
