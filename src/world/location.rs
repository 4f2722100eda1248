use std::fmt::{self, Display};

use log::warn;
use serde::Serialize;

use crate::error::MalariaError;
use crate::world::AgentId;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LocationKind {
    Household,
    Workplace,
    BreedingSite,
}

impl LocationKind {
    pub const ALL: [LocationKind; 3] = [
        LocationKind::Household,
        LocationKind::Workplace,
        LocationKind::BreedingSite,
    ];

    fn slot(self) -> usize {
        match self {
            LocationKind::Household => 0,
            LocationKind::Workplace => 1,
            LocationKind::BreedingSite => 2,
        }
    }
}

/// Decodes the integer kind codes used in external data (0 = household, 1 = workplace,
/// 2 = breeding site).
impl TryFrom<u8> for LocationKind {
    type Error = MalariaError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(LocationKind::Household),
            1 => Ok(LocationKind::Workplace),
            2 => Ok(LocationKind::BreedingSite),
            _ => Err(MalariaError::InvalidLocationId(format!(
                "unknown location kind code {code}"
            ))),
        }
    }
}

impl Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            LocationKind::Household => "household",
            LocationKind::Workplace => "workplace",
            LocationKind::BreedingSite => "breeding site",
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LocationId {
    pub kind: LocationKind,
    pub index: usize,
}

impl LocationId {
    #[must_use]
    pub fn new(kind: LocationKind, index: usize) -> Self {
        LocationId { kind, index }
    }
}

impl Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.index)
    }
}

#[derive(Clone, Debug)]
pub struct Location {
    id: LocationId,
    x: f64,
    y: f64,
    protected: bool,
    occupants: Vec<AgentId>,
}

impl Location {
    #[must_use]
    pub fn id(&self) -> LocationId {
        self.id
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Bed-net protection. Always `false` for anything but a household.
    #[must_use]
    pub fn is_protected(&self) -> bool {
        self.protected
    }

    /// Current occupants, in no particular order.
    #[must_use]
    pub fn occupants(&self) -> &[AgentId] {
        &self.occupants
    }

    #[must_use]
    pub fn distance_to(&self, other: &Location) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// All locations of the simulation, grouped by kind, plus the bookkeeping of occupancy
/// insertions that were dropped because a location was full.
#[derive(Clone, Debug)]
pub struct LocationIndex {
    locations: [Vec<Location>; 3],
    capacity: usize,
    capacity_drops: usize,
}

impl LocationIndex {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        LocationIndex {
            locations: [Vec::new(), Vec::new(), Vec::new()],
            capacity,
            capacity_drops: 0,
        }
    }

    /// Adds a location at `(x, y)`. `protected` is ignored for anything but a household.
    pub fn add_location(
        &mut self,
        kind: LocationKind,
        x: f64,
        y: f64,
        protected: bool,
    ) -> LocationId {
        let locations = &mut self.locations[kind.slot()];
        let id = LocationId::new(kind, locations.len());
        locations.push(Location {
            id,
            x,
            y,
            protected: protected && kind == LocationKind::Household,
            occupants: Vec::new(),
        });
        id
    }

    /// # Errors
    ///
    /// `InvalidLocationId` if `id` is out of range for its kind.
    pub fn lookup(&self, id: LocationId) -> Result<&Location, MalariaError> {
        self.locations[id.kind.slot()]
            .get(id.index)
            .ok_or_else(|| MalariaError::InvalidLocationId(id.to_string()))
    }

    fn lookup_mut(&mut self, id: LocationId) -> Result<&mut Location, MalariaError> {
        self.locations[id.kind.slot()]
            .get_mut(id.index)
            .ok_or_else(|| MalariaError::InvalidLocationId(id.to_string()))
    }

    #[must_use]
    pub fn locations(&self, kind: LocationKind) -> &[Location] {
        &self.locations[kind.slot()]
    }

    #[must_use]
    pub fn len(&self, kind: LocationKind) -> usize {
        self.locations[kind.slot()].len()
    }

    #[must_use]
    pub fn is_empty(&self, kind: LocationKind) -> bool {
        self.locations[kind.slot()].is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupancy insertions dropped because the target was full.
    #[must_use]
    pub fn capacity_drops(&self) -> usize {
        self.capacity_drops
    }

    /// Appends `agent` to the occupants of `id`. Returns `Ok(false)` and counts the drop if
    /// the location is full.
    pub(super) fn add_occupant(
        &mut self,
        id: LocationId,
        agent: AgentId,
    ) -> Result<bool, MalariaError> {
        let capacity = self.capacity;
        if self.lookup(id)?.occupants.len() >= capacity {
            self.capacity_drops += 1;
            warn!(
                "{}",
                MalariaError::CapacityExceeded {
                    location: id,
                    agent,
                    capacity,
                }
            );
            return Ok(false);
        }
        self.lookup_mut(id)?.occupants.push(agent);
        Ok(true)
    }

    /// Removes `agent` from the occupants of `id` by swapping with the last occupant.
    /// Returns whether it was present.
    pub(super) fn remove_occupant(
        &mut self,
        id: LocationId,
        agent: AgentId,
    ) -> Result<bool, MalariaError> {
        let location = self.lookup_mut(id)?;
        match location.occupants.iter().position(|&a| a == agent) {
            Some(position) => {
                location.occupants.swap_remove(position);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
