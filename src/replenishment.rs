//! Daily restoration of the mosquito population.
//!
//! When fewer than `mosquito_floor` mosquitoes are alive, the first dead slots (in id order)
//! are revived as newborn susceptible mosquitoes at random breeding sites until the floor is
//! reached. The total number of slots never changes.
use log::{debug, trace};
use rand::Rng;

use crate::clock::ContextClockExt;
use crate::context::{Context, ExecutionPhase};
use crate::define_rng;
use crate::destination::random_location;
use crate::error::MalariaError;
use crate::parameters::{ContextParametersExt, Parameters};
use crate::random::ContextRandomExt;
use crate::world::{ContextWorldExt, LocationKind, MosquitoId, World};

define_rng!(PopulationRng);

/// Revives dead mosquito slots until `mosquito_floor` are alive or no dead slot is left.
/// Returns the number revived.
///
/// # Errors
///
/// If the world has no breeding site.
pub fn replenish_mosquitoes<R: Rng + ?Sized>(
    world: &mut World,
    parameters: &Parameters,
    rng: &mut R,
) -> Result<usize, MalariaError> {
    let live = world.live_mosquito_count();
    let needed = parameters.mosquito_floor.saturating_sub(live);
    let mut revived = 0;
    let (min_age, max_age) = parameters.mosquito_age_range;

    for index in 0..world.mosquitoes().len() {
        if revived == needed {
            break;
        }
        if world.mosquitoes()[index].is_alive() {
            continue;
        }
        let age = rng.random_range(min_age..=max_age);
        let site = random_location(world.locations(), LocationKind::BreedingSite, rng)?;
        world.revive_mosquito(MosquitoId(index), age, site)?;
        trace!("mosquito {index} born at {site}");
        revived += 1;
    }
    Ok(revived)
}

/// Registers daily replenishment. Runs after the disease update.
pub fn init(context: &mut Context) {
    context.add_daily_plan(ExecutionPhase::Last, |context| {
        let result = {
            let parameters = context.get_params();
            let mut world = context.world_mut();
            context.sample(PopulationRng, |rng| {
                replenish_mosquitoes(&mut world, parameters, rng)
            })
        };
        match result {
            Ok(revived) => debug!("day {}: {revived} mosquitoes revived", context.current_day()),
            Err(e) => context.fail(e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::MosquitoState;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn world_with_mosquitoes(count: usize, dead: usize) -> World {
        let mut world = World::new(1000);
        let site = world.add_location(LocationKind::BreedingSite, 0.0, 0.0, false);
        world.add_location(LocationKind::BreedingSite, 10.0, 0.0, false);
        for _ in 0..count {
            world.add_mosquito(10, site).unwrap();
        }
        for index in 0..dead {
            world.mosquito_mut(MosquitoId(index)).expose(1);
            world.kill_mosquito(MosquitoId(index)).unwrap();
        }
        world
    }

    fn floor(mosquito_floor: usize) -> Parameters {
        Parameters {
            mosquito_floor,
            ..Parameters::default()
        }
    }

    #[test]
    fn revives_up_to_floor_from_first_dead_slots() {
        let mut world = world_with_mosquitoes(20, 12);
        let mut rng = SmallRng::seed_from_u64(0);
        let revived = replenish_mosquitoes(&mut world, &floor(15), &mut rng).unwrap();
        assert_eq!(revived, 7);
        assert_eq!(world.live_mosquito_count(), 15);
        for index in 0..7 {
            let mosquito = world.mosquito(MosquitoId(index));
            assert!(mosquito.is_alive());
            assert_eq!(mosquito.state, MosquitoState::Susceptible);
            assert_eq!(mosquito.exposure_day, None);
            assert!((1..=30).contains(&mosquito.age));
            assert_eq!(mosquito.location().kind, LocationKind::BreedingSite);
        }
        assert!(!world.mosquito(MosquitoId(7)).is_alive());
        world.check_consistency().unwrap();
    }

    #[test]
    fn nothing_to_do_above_floor() {
        let mut world = world_with_mosquitoes(20, 2);
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(
            replenish_mosquitoes(&mut world, &floor(10), &mut rng).unwrap(),
            0
        );
        assert_eq!(world.live_mosquito_count(), 18);
    }

    #[test]
    fn never_exceeds_slot_count() {
        let mut world = world_with_mosquitoes(10, 10);
        let mut rng = SmallRng::seed_from_u64(0);
        let revived = replenish_mosquitoes(&mut world, &floor(10), &mut rng).unwrap();
        assert_eq!(revived, 10);
        assert_eq!(world.mosquitoes().len(), 10);
        assert_eq!(world.live_mosquito_count(), 10);
    }

    #[test]
    fn no_slots_means_nothing_to_revive() {
        let mut world = World::new(10);
        world.add_location(LocationKind::BreedingSite, 0.0, 0.0, false);
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(
            replenish_mosquitoes(&mut world, &floor(5), &mut rng).unwrap(),
            0
        );
    }
}
