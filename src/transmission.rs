//! Hourly bite-driven transmission between co-located mosquitoes and humans.
//!
//! Live humans are grouped by their current location into an `HourlyContacts` value that is
//! built after movement and consumed by `resolve_bites`, so no grouping outlives its hour.
//! Mosquitoes are then visited in ascending id order:
//!
//! - an infectious mosquito bites with the hourly biting probability; if it does, it tries
//!   every co-located susceptible human in turn. A bed net attenuates the chance of
//!   infection and may kill the mosquito, which ends its biting for the hour.
//! - a susceptible mosquito sharing a location with infectious humans may become exposed.
//!   Treated humans are less infectious.
use log::{debug, trace};
use rand::Rng;

use crate::clock::ContextClockExt;
use crate::context::{Context, ExecutionPhase};
use crate::define_rng;
use crate::error::MalariaError;
use crate::parameters::{ContextParametersExt, Parameters};
use crate::random::ContextRandomExt;
use crate::world::{
    ContextWorldExt, HumanId, HumanState, LocationId, LocationKind, MosquitoId, MosquitoState,
    World,
};

define_rng!(TransmissionRng);

/// Live humans grouped by current location, for one hour.
#[derive(Debug)]
pub struct HourlyContacts {
    humans: [Vec<Vec<HumanId>>; 3],
}

fn kind_slot(kind: LocationKind) -> usize {
    match kind {
        LocationKind::Household => 0,
        LocationKind::Workplace => 1,
        LocationKind::BreedingSite => 2,
    }
}

impl HourlyContacts {
    /// Groups the live humans of `world` by their recorded current location, each group in
    /// ascending id order.
    #[must_use]
    pub fn build(world: &World) -> Self {
        let mut humans =
            LocationKind::ALL.map(|kind| vec![Vec::new(); world.locations().len(kind)]);
        for human in world.live_humans() {
            let location = human.location();
            if let Some(group) = humans[kind_slot(location.kind)].get_mut(location.index) {
                group.push(human.id());
            }
        }
        HourlyContacts { humans }
    }

    /// Humans present at `location` when the contacts were built.
    #[must_use]
    pub fn humans_at(&self, location: LocationId) -> &[HumanId] {
        self.humans[kind_slot(location.kind)]
            .get(location.index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TransmissionSummary {
    /// Infectious mosquitoes that went biting this hour.
    pub bite_attempts: usize,
    pub human_infections: usize,
    pub treatments_started: usize,
    pub mosquito_exposures: usize,
    /// Mosquitoes killed by bed-net contact.
    pub net_kills: usize,
}

/// Resolves one hour of bites.
///
/// # Errors
///
/// If the world is inconsistent (a mosquito killed by a net is already dead, or its location
/// does not exist).
pub fn resolve_bites<R: Rng + ?Sized>(
    world: &mut World,
    contacts: HourlyContacts,
    parameters: &Parameters,
    day: u32,
    rng: &mut R,
) -> Result<TransmissionSummary, MalariaError> {
    let biting_prob = parameters.hourly_biting_prob();
    let mut summary = TransmissionSummary::default();

    for index in 0..world.mosquitoes().len() {
        let mosquito = &world.mosquitoes()[index];
        if !mosquito.is_alive() {
            continue;
        }
        let id = MosquitoId(index);
        let location = mosquito.location();
        let state = mosquito.state;
        let local_humans = contacts.humans_at(location);
        if local_humans.is_empty() {
            continue;
        }

        match state {
            MosquitoState::Infectious => {
                if !rng.random_bool(biting_prob) {
                    continue;
                }
                summary.bite_attempts += 1;
                for &human_id in local_humans {
                    let human = world.human(human_id);
                    if !human.is_alive() || human.state != HumanState::Susceptible {
                        continue;
                    }
                    let bed_net = human.has_bed_net();
                    let mut infection_prob = parameters.mosquito_to_human_prob;
                    if bed_net {
                        infection_prob *= 1.0 - parameters.bed_net_efficacy;
                    }

                    if rng.random_bool(infection_prob) {
                        let human = world.human_mut(human_id);
                        human.infect(day);
                        summary.human_infections += 1;
                        trace!("mosquito {index} infected human {} at {location}", human_id.0);
                        if rng.random_bool(parameters.treatment_rate) {
                            human.start_treatment(day);
                            summary.treatments_started += 1;
                        }
                    }

                    if bed_net && rng.random_bool(parameters.bed_net_kill_prob) {
                        world.kill_mosquito(id)?;
                        summary.net_kills += 1;
                        trace!("mosquito {index} killed by a bed net at {location}");
                        break;
                    }
                }
            }
            MosquitoState::Susceptible => {
                let infectivity: f64 = local_humans
                    .iter()
                    .map(|&human_id| world.human(human_id))
                    .filter(|human| human.is_alive() && human.state == HumanState::Infectious)
                    .map(|human| {
                        if human.under_treatment {
                            1.0 - parameters.treatment_effect
                        } else {
                            1.0
                        }
                    })
                    .sum();
                if infectivity > 0.0
                    && rng.random_bool(biting_prob)
                    && rng.random_bool(parameters.human_to_mosquito_prob)
                {
                    world.mosquito_mut(id).expose(day);
                    summary.mosquito_exposures += 1;
                    trace!("mosquito {index} exposed at {location}");
                }
            }
            MosquitoState::Exposed => {}
        }
    }
    Ok(summary)
}

/// Registers hourly transmission. Runs after movement in every hour.
pub fn init(context: &mut Context) {
    context.add_hourly_plan(ExecutionPhase::Normal, |context| {
        let day = context.current_day();
        let result = {
            let parameters = context.get_params();
            let mut world = context.world_mut();
            let contacts = HourlyContacts::build(&world);
            context.sample(TransmissionRng, |rng| {
                resolve_bites(&mut world, contacts, parameters, day, rng)
            })
        };
        match result {
            Ok(summary) => {
                if summary != TransmissionSummary::default() {
                    debug!("hour {}: {summary:?}", context.current_hour());
                }
            }
            Err(e) => context.fail(e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::AgentId;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    struct Setup {
        world: World,
        house: LocationId,
        work: LocationId,
    }

    fn setup(protected: bool) -> Setup {
        let mut world = World::new(100);
        let house = world.add_location(LocationKind::Household, 0.0, 0.0, protected);
        let work = world.add_location(LocationKind::Workplace, 1.0, 1.0, false);
        world.add_location(LocationKind::BreedingSite, 2.0, 2.0, false);
        Setup { world, house, work }
    }

    fn add_mosquito_at(
        world: &mut World,
        location: LocationId,
        state: MosquitoState,
    ) -> MosquitoId {
        let site = LocationId::new(LocationKind::BreedingSite, 0);
        let id = world.add_mosquito(5, site).unwrap();
        world.move_mosquito(id, location).unwrap();
        world.mosquito_mut(id).state = state;
        id
    }

    fn certain_bites() -> Parameters {
        Parameters {
            daily_biting_prob: 1.0,
            mosquito_to_human_prob: 1.0,
            human_to_mosquito_prob: 1.0,
            treatment_rate: 0.0,
            ..Parameters::default()
        }
    }

    fn run_hour(
        world: &mut World,
        parameters: &Parameters,
        rng: &mut SmallRng,
    ) -> TransmissionSummary {
        let contacts = HourlyContacts::build(world);
        resolve_bites(world, contacts, parameters, 3, rng).unwrap()
    }

    #[test]
    fn contacts_reflect_current_locations() {
        let Setup {
            mut world,
            house,
            work,
        } = setup(false);
        let a = world.add_human(30, house, work).unwrap();
        let b = world.add_human(30, house, work).unwrap();
        let c = world.add_human(30, house, work).unwrap();
        world.move_human(b, work).unwrap();
        world.kill_human(c).unwrap();

        let contacts = HourlyContacts::build(&world);
        assert_eq!(contacts.humans_at(house), &[a]);
        assert_eq!(contacts.humans_at(work), &[b]);
        assert!(contacts
            .humans_at(LocationId::new(LocationKind::BreedingSite, 0))
            .is_empty());

        world.move_human(b, house).unwrap();
        let contacts = HourlyContacts::build(&world);
        assert_eq!(contacts.humans_at(house), &[a, b]);
        assert!(contacts.humans_at(work).is_empty());
    }

    #[test]
    fn infectious_mosquito_infects_all_susceptible_humans() {
        let Setup {
            mut world,
            house,
            work,
        } = setup(false);
        let humans: Vec<_> = (0..3).map(|_| world.add_human(30, house, work).unwrap()).collect();
        world.human_mut(humans[1]).state = HumanState::Recovered;
        add_mosquito_at(&mut world, house, MosquitoState::Infectious);

        // The hourly biting probability is capped at 1/24, so retry until the mosquito bites.
        let parameters = certain_bites();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut summary = TransmissionSummary::default();
        while summary.bite_attempts == 0 {
            summary = run_hour(&mut world, &parameters, &mut rng);
        }
        assert_eq!(summary.human_infections, 2);
        assert_eq!(world.human(humans[0]).state, HumanState::Infectious);
        assert_eq!(world.human(humans[0]).infection_day, Some(3));
        assert_eq!(world.human(humans[1]).state, HumanState::Recovered);
        assert_eq!(world.human(humans[2]).state, HumanState::Infectious);
    }

    #[test]
    fn net_kill_stops_further_bites() {
        let Setup {
            mut world,
            house,
            work,
        } = setup(true);
        let humans: Vec<_> = (0..3).map(|_| world.add_human(30, house, work).unwrap()).collect();
        let mosquito = add_mosquito_at(&mut world, house, MosquitoState::Infectious);
        let parameters = Parameters {
            bed_net_efficacy: 1.0,
            bed_net_kill_prob: 1.0,
            ..certain_bites()
        };
        let mut rng = SmallRng::seed_from_u64(2);
        let mut summary = TransmissionSummary::default();
        while summary.bite_attempts == 0 {
            summary = run_hour(&mut world, &parameters, &mut rng);
        }
        assert_eq!(summary.net_kills, 1);
        assert_eq!(summary.human_infections, 0);
        assert!(!world.mosquito(mosquito).is_alive());
        assert!(world
            .locations()
            .lookup(house)
            .unwrap()
            .occupants()
            .iter()
            .all(|agent| humans.iter().any(|&h| *agent == AgentId::from(h))));
        world.check_consistency().unwrap();
    }

    #[test]
    fn susceptible_mosquito_needs_infectious_company() {
        let Setup {
            mut world,
            house,
            work,
        } = setup(false);
        let human = world.add_human(30, house, work).unwrap();
        let mosquito = add_mosquito_at(&mut world, house, MosquitoState::Susceptible);
        let parameters = certain_bites();
        let mut rng = SmallRng::seed_from_u64(3);

        for _ in 0..500 {
            run_hour(&mut world, &parameters, &mut rng);
        }
        assert_eq!(world.mosquito(mosquito).state, MosquitoState::Susceptible);

        world.human_mut(human).infect(0);
        let mut hours = 0;
        while world.mosquito(mosquito).state == MosquitoState::Susceptible {
            run_hour(&mut world, &parameters, &mut rng);
            hours += 1;
            assert!(hours < 10_000);
        }
        assert_eq!(world.mosquito(mosquito).state, MosquitoState::Exposed);
        assert_eq!(world.mosquito(mosquito).exposure_day, Some(3));
    }

    #[test]
    fn fully_treated_humans_do_not_infect() {
        let Setup {
            mut world,
            house,
            work,
        } = setup(false);
        let human = world.add_human(30, house, work).unwrap();
        world.human_mut(human).infect(0);
        world.human_mut(human).start_treatment(0);
        let mosquito = add_mosquito_at(&mut world, house, MosquitoState::Susceptible);
        let parameters = Parameters {
            treatment_effect: 1.0,
            ..certain_bites()
        };
        let mut rng = SmallRng::seed_from_u64(4);
        for _ in 0..2000 {
            run_hour(&mut world, &parameters, &mut rng);
        }
        assert_eq!(world.mosquito(mosquito).state, MosquitoState::Susceptible);
    }

    #[test]
    fn exposed_mosquitoes_and_recovered_humans_do_not_participate() {
        let Setup {
            mut world,
            house,
            work,
        } = setup(false);
        let recovered = world.add_human(30, house, work).unwrap();
        world.human_mut(recovered).state = HumanState::Recovered;
        let susceptible = world.add_human(30, house, work).unwrap();
        add_mosquito_at(&mut world, house, MosquitoState::Exposed);
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..2000 {
            let summary = run_hour(&mut world, &certain_bites(), &mut rng);
            assert_eq!(summary, TransmissionSummary::default());
        }
        assert_eq!(world.human(susceptible).state, HumanState::Susceptible);
    }

    #[test]
    fn mosquitoes_away_from_humans_draw_nothing() {
        let Setup {
            mut world,
            house,
            work,
        } = setup(false);
        world.add_human(30, house, work).unwrap();
        add_mosquito_at(&mut world, work, MosquitoState::Infectious);
        let mut rng = SmallRng::seed_from_u64(6);
        let mut untouched = rng.clone();
        run_hour(&mut world, &certain_bites(), &mut rng);
        assert_eq!(rng.random::<u64>(), untouched.random::<u64>());
    }
}
