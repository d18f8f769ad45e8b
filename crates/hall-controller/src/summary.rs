//! End-of-event summary.
//!
//! Built from the registry after every participant task has joined, so the
//! counts it reads have no concurrent writers left.

use common::types::RoomId;
use std::fmt;

use crate::errors::HcError;
use crate::registry::RoomRegistry;

/// Final attendance of one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSummary {
    pub room: RoomId,
    pub count: u32,
    pub capacity: u32,
}

impl RoomSummary {
    #[must_use]
    pub fn over_capacity(&self) -> bool {
        self.count > self.capacity
    }

    #[must_use]
    pub fn over_by(&self) -> u32 {
        self.count.saturating_sub(self.capacity)
    }
}

/// Final attendance of the whole event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSummary {
    pub rooms: Vec<RoomSummary>,
    pub population: u32,
    pub total_attended: u32,
    /// Participants that ended cancelled or failed.
    pub failures: u32,
    pub cancelled: bool,
}

impl EventSummary {
    /// Read every room's final count.
    pub fn from_registry(
        registry: &RoomRegistry,
        population: u32,
        failures: u32,
        cancelled: bool,
    ) -> Result<Self, HcError> {
        let rooms = registry
            .rooms()
            .map(|room| {
                Ok(RoomSummary {
                    room: room.id,
                    count: registry.final_count(room.id)?,
                    capacity: room.capacity,
                })
            })
            .collect::<Result<Vec<_>, HcError>>()?;
        let total_attended = rooms.iter().map(|r| r.count).sum();

        Ok(Self {
            rooms,
            population,
            total_attended,
            failures,
            cancelled,
        })
    }

    /// Rooms that ended over capacity.
    pub fn over_capacity_rooms(&self) -> impl Iterator<Item = &RoomSummary> {
        self.rooms.iter().filter(|r| r.over_capacity())
    }

    /// Whether every participant was counted exactly once.
    #[must_use]
    pub fn is_conserved(&self) -> bool {
        self.total_attended == self.population
    }

    #[must_use]
    pub fn room(&self, room: RoomId) -> Option<&RoomSummary> {
        self.rooms.iter().find(|r| r.room == room)
    }
}

impl fmt::Display for EventSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Event Summary ===")?;
        for room in &self.rooms {
            write!(f, "Room {}: {}/{}", room.room, room.count, room.capacity)?;
            if room.over_capacity() {
                write!(f, " (over by {})", room.over_by())?;
            }
            writeln!(f)?;
        }
        write!(
            f,
            "Total: {}/{} attended",
            self.total_attended, self.population
        )?;
        if self.failures > 0 {
            write!(f, "\nFailures: {}", self.failures)?;
        }
        if self.cancelled {
            write!(f, "\nEvent cancelled before completion")?;
        }
        Ok(())
    }
}
