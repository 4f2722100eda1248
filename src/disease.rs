//! Daily disease progression and background mortality.
//!
//! Humans: infectious humans past the recovery delay recover with the base recovery
//! probability (higher under treatment). Mosquitoes: exposed mosquitoes past the extrinsic
//! incubation period become infectious. Every live agent then faces its daily mortality
//! draw. Dead humans are never replaced; dead mosquito slots are left for replenishment.
use log::debug;
use rand::Rng;

use crate::clock::ContextClockExt;
use crate::context::{Context, ExecutionPhase};
use crate::define_rng;
use crate::error::MalariaError;
use crate::parameters::{ContextParametersExt, Parameters};
use crate::random::ContextRandomExt;
use crate::world::{ContextWorldExt, HumanId, HumanState, MosquitoId, MosquitoState, World};

define_rng!(DiseaseRng);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DiseaseSummary {
    pub recoveries: usize,
    pub mosquitoes_became_infectious: usize,
    pub human_deaths: usize,
    pub mosquito_deaths: usize,
}

fn elapsed_at_least(onset: Option<u32>, day: u32, days: u32) -> bool {
    onset.is_some_and(|onset| day.saturating_sub(onset) >= days)
}

/// Advances every live human, then every live mosquito, in ascending id order.
///
/// # Errors
///
/// If a dying agent's location does not exist.
pub fn advance_disease<R: Rng + ?Sized>(
    world: &mut World,
    parameters: &Parameters,
    day: u32,
    rng: &mut R,
) -> Result<DiseaseSummary, MalariaError> {
    let mut summary = DiseaseSummary::default();

    for index in 0..world.humans().len() {
        let id = HumanId(index);
        let human = world.human_mut(id);
        if !human.is_alive() {
            continue;
        }
        if human.state == HumanState::Infectious
            && elapsed_at_least(human.infection_day, day, parameters.recovery_delay_days)
            && rng.random_bool(parameters.recovery_prob(human.under_treatment))
        {
            human.state = HumanState::Recovered;
            summary.recoveries += 1;
        }
        if rng.random_bool(parameters.human_mortality) {
            world.kill_human(id)?;
            summary.human_deaths += 1;
        }
    }

    for index in 0..world.mosquitoes().len() {
        let id = MosquitoId(index);
        let mosquito = world.mosquito_mut(id);
        if !mosquito.is_alive() {
            continue;
        }
        if mosquito.state == MosquitoState::Exposed
            && elapsed_at_least(
                mosquito.exposure_day,
                day,
                parameters.extrinsic_incubation_days,
            )
        {
            mosquito.state = MosquitoState::Infectious;
            summary.mosquitoes_became_infectious += 1;
        }
        if rng.random_bool(parameters.mosquito_mortality) {
            world.kill_mosquito(id)?;
            summary.mosquito_deaths += 1;
        }
    }
    Ok(summary)
}

/// Registers the daily disease update. Runs after the last hour's transmission and before
/// replenishment.
pub fn init(context: &mut Context) {
    context.add_daily_plan(ExecutionPhase::Last, |context| {
        let day = context.current_day();
        let result = {
            let parameters = context.get_params();
            let mut world = context.world_mut();
            context.sample(DiseaseRng, |rng| {
                advance_disease(&mut world, parameters, day, rng)
            })
        };
        match result {
            Ok(summary) => debug!("day {day}: {summary:?}"),
            Err(e) => context.fail(e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{LocationId, LocationKind};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn world() -> (World, LocationId, LocationId, LocationId) {
        let mut world = World::new(1000);
        let house = world.add_location(LocationKind::Household, 0.0, 0.0, false);
        let work = world.add_location(LocationKind::Workplace, 0.0, 0.0, false);
        let site = world.add_location(LocationKind::BreedingSite, 0.0, 0.0, false);
        (world, house, work, site)
    }

    fn immortal() -> Parameters {
        Parameters {
            human_mortality: 0.0,
            mosquito_mortality: 0.0,
            ..Parameters::default()
        }
    }

    #[test]
    fn no_recovery_before_delay() {
        let (mut world, house, work, _) = world();
        let human = world.add_human(30, house, work).unwrap();
        world.human_mut(human).infect(5);
        let parameters = Parameters {
            human_recovery_prob: 1.0,
            ..immortal()
        };
        let mut rng = SmallRng::seed_from_u64(0);
        for day in 5..19 {
            advance_disease(&mut world, &parameters, day, &mut rng).unwrap();
            assert_eq!(world.human(human).state, HumanState::Infectious, "day {day}");
        }
        let summary = advance_disease(&mut world, &parameters, 19, &mut rng).unwrap();
        assert_eq!(summary.recoveries, 1);
        assert_eq!(world.human(human).state, HumanState::Recovered);
    }

    #[test]
    fn treatment_speeds_recovery() {
        let (mut world, house, work, _) = world();
        let humans: Vec<_> = (0..400)
            .map(|_| world.add_human(30, house, work).unwrap())
            .collect();
        for (i, &human) in humans.iter().enumerate() {
            world.human_mut(human).infect(0);
            if i % 2 == 0 {
                world.human_mut(human).start_treatment(0);
            }
        }
        let mut rng = SmallRng::seed_from_u64(1);
        advance_disease(&mut world, &immortal(), 14, &mut rng).unwrap();
        let recovered = |treated: bool| {
            humans
                .iter()
                .filter(|&&h| {
                    let human = world.human(h);
                    human.under_treatment == treated && human.state == HumanState::Recovered
                })
                .count()
        };
        // Expected 200 * 3/14 ~ 43 treated and 200 / 14 ~ 14 untreated.
        assert!(recovered(true) > 25, "treated {}", recovered(true));
        assert!(recovered(false) < 28, "untreated {}", recovered(false));
        assert!(recovered(true) > recovered(false));
    }

    #[test]
    fn incubation_gate_is_exact() {
        let (mut world, _, _, site) = world();
        let mosquito = world.add_mosquito(3, site).unwrap();
        world.mosquito_mut(mosquito).expose(2);
        let mut rng = SmallRng::seed_from_u64(2);
        advance_disease(&mut world, &immortal(), 11, &mut rng).unwrap();
        assert_eq!(world.mosquito(mosquito).state, MosquitoState::Exposed);
        let summary = advance_disease(&mut world, &immortal(), 12, &mut rng).unwrap();
        assert_eq!(summary.mosquitoes_became_infectious, 1);
        assert_eq!(world.mosquito(mosquito).state, MosquitoState::Infectious);
    }

    #[test]
    fn mortality_removes_agents_from_locations() {
        let (mut world, house, work, site) = world();
        for _ in 0..10 {
            world.add_human(30, house, work).unwrap();
            world.add_mosquito(3, site).unwrap();
        }
        let parameters = Parameters {
            human_mortality: 1.0,
            mosquito_mortality: 1.0,
            ..Parameters::default()
        };
        let mut rng = SmallRng::seed_from_u64(3);
        let summary = advance_disease(&mut world, &parameters, 0, &mut rng).unwrap();
        assert_eq!(summary.human_deaths, 10);
        assert_eq!(summary.mosquito_deaths, 10);
        assert!(world.locations().lookup(house).unwrap().occupants().is_empty());
        assert!(world.locations().lookup(site).unwrap().occupants().is_empty());
        world.check_consistency().unwrap();

        // The dead are not processed again.
        let summary = advance_disease(&mut world, &parameters, 1, &mut rng).unwrap();
        assert_eq!(summary, DiseaseSummary::default());
    }
}
