//! The model state: every location, every human and every mosquito.
//!
//! `World` keeps agent→location and location→occupant relations consistent. The only
//! ways to change an agent's location are `move_human` / `move_mosquito`, death, and
//! revival, each of which updates both sides.
mod agents;
mod location;

use std::cell::{Ref, RefCell, RefMut};

pub use agents::{AgentId, Human, HumanId, HumanState, Mosquito, MosquitoId, MosquitoState};
pub use location::{Location, LocationId, LocationIndex, LocationKind};

use log::trace;

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::MalariaError;
use crate::{HashMap, HashMapExt};

#[derive(Clone, Debug)]
pub struct World {
    locations: LocationIndex,
    humans: Vec<Human>,
    mosquitoes: Vec<Mosquito>,
    revivals: usize,
}

fn expect_kind(id: LocationId, kind: LocationKind) -> Result<(), MalariaError> {
    if id.kind == kind {
        Ok(())
    } else {
        Err(MalariaError::InvalidLocationId(format!(
            "{id} where a {kind} was expected"
        )))
    }
}

impl World {
    /// Creates an empty world whose locations hold at most `capacity` occupants each.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        World {
            locations: LocationIndex::new(capacity),
            humans: Vec::new(),
            mosquitoes: Vec::new(),
            revivals: 0,
        }
    }

    #[must_use]
    pub fn locations(&self) -> &LocationIndex {
        &self.locations
    }

    pub fn add_location(
        &mut self,
        kind: LocationKind,
        x: f64,
        y: f64,
        protected: bool,
    ) -> LocationId {
        self.locations.add_location(kind, x, y, protected)
    }

    /// Adds a susceptible, untreated human at its home. The bed-net flag is taken from the
    /// home household.
    ///
    /// # Errors
    ///
    /// `InvalidLocationId` if `home` is not a household or `work` is not a workplace that
    /// exists.
    pub fn add_human(
        &mut self,
        age: u32,
        home: LocationId,
        work: LocationId,
    ) -> Result<HumanId, MalariaError> {
        expect_kind(home, LocationKind::Household)?;
        expect_kind(work, LocationKind::Workplace)?;
        self.locations.lookup(work)?;
        let bed_net = self.locations.lookup(home)?.is_protected();

        let id = HumanId(self.humans.len());
        self.humans.push(Human {
            id,
            state: HumanState::Susceptible,
            infection_day: None,
            age,
            home,
            work,
            location: home,
            bed_net,
            under_treatment: false,
            treatment_day: None,
            alive: true,
        });
        self.locations.add_occupant(home, id.into())?;
        Ok(id)
    }

    /// Adds a susceptible mosquito at `breeding_site`.
    ///
    /// # Errors
    ///
    /// `InvalidLocationId` if `breeding_site` is not a breeding site that exists.
    pub fn add_mosquito(
        &mut self,
        age: u32,
        breeding_site: LocationId,
    ) -> Result<MosquitoId, MalariaError> {
        expect_kind(breeding_site, LocationKind::BreedingSite)?;
        self.locations.lookup(breeding_site)?;

        let id = MosquitoId(self.mosquitoes.len());
        self.mosquitoes.push(Mosquito {
            id,
            state: MosquitoState::Susceptible,
            exposure_day: None,
            age,
            breeding_site,
            location: breeding_site,
            alive: true,
        });
        self.locations.add_occupant(breeding_site, id.into())?;
        Ok(id)
    }

    /// Every human slot, dead or alive, in id order.
    #[must_use]
    pub fn humans(&self) -> &[Human] {
        &self.humans
    }

    /// Every mosquito slot, dead or alive, in id order.
    #[must_use]
    pub fn mosquitoes(&self) -> &[Mosquito] {
        &self.mosquitoes
    }

    #[must_use]
    pub fn human(&self, id: HumanId) -> &Human {
        &self.humans[id.0]
    }

    pub fn human_mut(&mut self, id: HumanId) -> &mut Human {
        &mut self.humans[id.0]
    }

    #[must_use]
    pub fn mosquito(&self, id: MosquitoId) -> &Mosquito {
        &self.mosquitoes[id.0]
    }

    pub fn mosquito_mut(&mut self, id: MosquitoId) -> &mut Mosquito {
        &mut self.mosquitoes[id.0]
    }

    pub fn live_humans(&self) -> impl Iterator<Item = &Human> {
        self.humans.iter().filter(|human| human.alive)
    }

    pub fn live_mosquitoes(&self) -> impl Iterator<Item = &Mosquito> {
        self.mosquitoes.iter().filter(|mosquito| mosquito.alive)
    }

    /// Number of mosquito slots revived since the world was created.
    #[must_use]
    pub fn revivals(&self) -> usize {
        self.revivals
    }

    #[must_use]
    pub fn live_mosquito_count(&self) -> usize {
        self.live_mosquitoes().count()
    }

    fn relocate(
        &mut self,
        agent: AgentId,
        from: LocationId,
        to: LocationId,
    ) -> Result<(), MalariaError> {
        self.locations.lookup(to)?;
        self.locations.remove_occupant(from, agent)?;
        self.locations.add_occupant(to, agent)?;
        Ok(())
    }

    /// Moves a live human to `destination`. Returns `false` without touching occupancy if
    /// the human is already there.
    ///
    /// # Errors
    ///
    /// `DeadAgent` if the human is dead, `InvalidLocationId` if `destination` does not exist.
    pub fn move_human(
        &mut self,
        id: HumanId,
        destination: LocationId,
    ) -> Result<bool, MalariaError> {
        let human = &self.humans[id.0];
        if !human.alive {
            return Err(MalariaError::DeadAgent(id.into()));
        }
        let from = human.location;
        if from == destination {
            return Ok(false);
        }
        self.relocate(id.into(), from, destination)?;
        self.humans[id.0].location = destination;
        Ok(true)
    }

    /// Moves a live mosquito to `destination`. Returns `false` without touching occupancy if
    /// the mosquito is already there.
    ///
    /// # Errors
    ///
    /// `DeadAgent` if the mosquito is dead, `InvalidLocationId` if `destination` does not
    /// exist.
    pub fn move_mosquito(
        &mut self,
        id: MosquitoId,
        destination: LocationId,
    ) -> Result<bool, MalariaError> {
        let mosquito = &self.mosquitoes[id.0];
        if !mosquito.alive {
            return Err(MalariaError::DeadAgent(id.into()));
        }
        let from = mosquito.location;
        if from == destination {
            return Ok(false);
        }
        self.relocate(id.into(), from, destination)?;
        self.mosquitoes[id.0].location = destination;
        Ok(true)
    }

    /// Tombstones a human and removes it from its location. The slot is never reused.
    ///
    /// # Errors
    ///
    /// `DeadAgent` if the human is already dead.
    pub fn kill_human(&mut self, id: HumanId) -> Result<(), MalariaError> {
        let human = &mut self.humans[id.0];
        if !human.alive {
            return Err(MalariaError::DeadAgent(id.into()));
        }
        human.alive = false;
        let location = human.location;
        self.locations.remove_occupant(location, id.into())?;
        trace!("human {} died at {location}", id.0);
        Ok(())
    }

    /// Tombstones a mosquito and removes it from its location. The slot may be revived.
    ///
    /// # Errors
    ///
    /// `DeadAgent` if the mosquito is already dead.
    pub fn kill_mosquito(&mut self, id: MosquitoId) -> Result<(), MalariaError> {
        let mosquito = &mut self.mosquitoes[id.0];
        if !mosquito.alive {
            return Err(MalariaError::DeadAgent(id.into()));
        }
        mosquito.alive = false;
        let location = mosquito.location;
        self.locations.remove_occupant(location, id.into())?;
        trace!("mosquito {} died at {location}", id.0);
        Ok(())
    }

    /// Brings a dead mosquito slot back as a newborn susceptible mosquito at `breeding_site`.
    ///
    /// # Errors
    ///
    /// If the slot is alive, or `breeding_site` is not an existing breeding site.
    pub fn revive_mosquito(
        &mut self,
        id: MosquitoId,
        age: u32,
        breeding_site: LocationId,
    ) -> Result<(), MalariaError> {
        expect_kind(breeding_site, LocationKind::BreedingSite)?;
        self.locations.lookup(breeding_site)?;
        let mosquito = &mut self.mosquitoes[id.0];
        if mosquito.alive {
            return Err(MalariaError::from(format!(
                "cannot revive mosquito {}: it is alive",
                id.0
            )));
        }
        *mosquito = Mosquito {
            id,
            state: MosquitoState::Susceptible,
            exposure_day: None,
            age,
            breeding_site,
            location: breeding_site,
            alive: true,
        };
        self.revivals += 1;
        self.locations.add_occupant(breeding_site, id.into())?;
        Ok(())
    }

    /// Verifies that occupancy and agent locations agree: every occupant is a live agent
    /// recorded at that location, no agent is listed twice, no location is over capacity, and
    /// every live agent is listed at its location unless an insertion was dropped.
    ///
    /// # Errors
    ///
    /// A description of the first inconsistency found.
    pub fn check_consistency(&self) -> Result<(), MalariaError> {
        let mut seen: HashMap<AgentId, LocationId> =
            HashMap::with_capacity(self.humans.len() + self.mosquitoes.len());
        for kind in LocationKind::ALL {
            for location in self.locations.locations(kind) {
                if location.occupants().len() > self.locations.capacity() {
                    return Err(format!("{} holds more than its capacity", location.id()).into());
                }
                for &agent in location.occupants() {
                    let (alive, recorded) = match agent {
                        AgentId::Human(id) => {
                            let human = &self.humans[id.0];
                            (human.alive, human.location)
                        }
                        AgentId::Mosquito(id) => {
                            let mosquito = &self.mosquitoes[id.0];
                            (mosquito.alive, mosquito.location)
                        }
                    };
                    if !alive {
                        return Err(MalariaError::DeadAgent(agent));
                    }
                    if recorded != location.id() {
                        return Err(format!(
                            "{agent} is listed at {} but located at {recorded}",
                            location.id()
                        )
                        .into());
                    }
                    if seen.insert(agent, location.id()).is_some() {
                        return Err(format!("{agent} is listed twice").into());
                    }
                }
            }
        }

        if self.locations.capacity_drops() == 0 {
            let live_agents = self
                .live_humans()
                .map(|human| AgentId::from(human.id))
                .chain(self.live_mosquitoes().map(|mosquito| mosquito.id.into()));
            for agent in live_agents {
                if !seen.contains_key(&agent) {
                    return Err(format!("{agent} is missing from its location").into());
                }
            }
        }
        Ok(())
    }
}

define_data_plugin!(WorldPlugin, RefCell<World>, RefCell::new(World::new(0)));

/// Access to the `World` held by a `Context`. The world sits behind a `RefCell` so that it
/// can be borrowed mutably while a random stream is sampled from the same context.
pub trait ContextWorldExt {
    fn set_world(&mut self, world: World);

    /// # Panics
    ///
    /// If no world was set, or it is mutably borrowed.
    fn world(&self) -> Ref<'_, World>;

    /// # Panics
    ///
    /// If no world was set, or it is already borrowed.
    fn world_mut(&self) -> RefMut<'_, World>;
}

impl ContextWorldExt for Context {
    fn set_world(&mut self, world: World) {
        *self.get_data_mut(WorldPlugin).get_mut() = world;
    }

    fn world(&self) -> Ref<'_, World> {
        self.get_data(WorldPlugin).borrow()
    }

    fn world_mut(&self) -> RefMut<'_, World> {
        self.get_data(WorldPlugin).borrow_mut()
    }
}
