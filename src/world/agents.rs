use std::fmt::{self, Display};

use serde::Serialize;

use crate::world::LocationId;

/// Stable index of a human slot. Slots are never reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HumanId(pub usize);

/// Stable index of a mosquito slot. Dead slots may be revived by replenishment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MosquitoId(pub usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AgentId {
    Human(HumanId),
    Mosquito(MosquitoId),
}

impl Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AgentId::Human(HumanId(index)) => write!(f, "human {index}"),
            AgentId::Mosquito(MosquitoId(index)) => write!(f, "mosquito {index}"),
        }
    }
}

impl From<HumanId> for AgentId {
    fn from(id: HumanId) -> Self {
        AgentId::Human(id)
    }
}

impl From<MosquitoId> for AgentId {
    fn from(id: MosquitoId) -> Self {
        AgentId::Mosquito(id)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum HumanState {
    Susceptible,
    Infectious,
    Recovered,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum MosquitoState {
    Susceptible,
    Exposed,
    Infectious,
}

#[derive(Clone, Debug)]
pub struct Human {
    pub(super) id: HumanId,
    pub state: HumanState,
    /// Day the human became infectious.
    pub infection_day: Option<u32>,
    pub age: u32,
    pub(super) home: LocationId,
    pub(super) work: LocationId,
    pub(super) location: LocationId,
    /// Sleeps under a bed net. Fixed for the whole run.
    pub(super) bed_net: bool,
    pub under_treatment: bool,
    pub treatment_day: Option<u32>,
    pub(super) alive: bool,
}

impl Human {
    #[must_use]
    pub fn id(&self) -> HumanId {
        self.id
    }

    #[must_use]
    pub fn home(&self) -> LocationId {
        self.home
    }

    #[must_use]
    pub fn work(&self) -> LocationId {
        self.work
    }

    #[must_use]
    pub fn location(&self) -> LocationId {
        self.location
    }

    #[must_use]
    pub fn has_bed_net(&self) -> bool {
        self.bed_net
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Marks the human infectious as of `day`.
    pub fn infect(&mut self, day: u32) {
        self.state = HumanState::Infectious;
        self.infection_day = Some(day);
    }

    /// Enrolls the human in treatment as of `day`.
    pub fn start_treatment(&mut self, day: u32) {
        self.under_treatment = true;
        self.treatment_day = Some(day);
    }
}

#[derive(Clone, Debug)]
pub struct Mosquito {
    pub(super) id: MosquitoId,
    pub state: MosquitoState,
    /// Day the mosquito was exposed.
    pub exposure_day: Option<u32>,
    pub age: u32,
    pub(super) breeding_site: LocationId,
    pub(super) location: LocationId,
    pub(super) alive: bool,
}

impl Mosquito {
    #[must_use]
    pub fn id(&self) -> MosquitoId {
        self.id
    }

    #[must_use]
    pub fn breeding_site(&self) -> LocationId {
        self.breeding_site
    }

    #[must_use]
    pub fn location(&self) -> LocationId {
        self.location
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Marks the mosquito exposed as of `day`.
    pub fn expose(&mut self, day: u32) {
        self.state = MosquitoState::Exposed;
        self.exposure_day = Some(day);
    }
}
