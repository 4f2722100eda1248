//! Population initialisation.
//!
//! Locations are scattered uniformly over the grid, then humans and mosquitoes are created
//! in id order and placed at home or at their breeding site. The first few agents of each
//! kind are seeded infectious.
use log::info;
use rand::Rng;

use crate::context::Context;
use crate::define_rng;
use crate::error::MalariaError;
use crate::parameters::{ContextParametersExt, Parameters};
use crate::random::ContextRandomExt;
use crate::world::{ContextWorldExt, LocationId, LocationKind, MosquitoState, World};

define_rng!(SetupRng);

fn add_locations<R: Rng + ?Sized>(
    world: &mut World,
    kind: LocationKind,
    count: usize,
    parameters: &Parameters,
    rng: &mut R,
) {
    for _ in 0..count {
        let x = rng.random::<f64>() * parameters.grid_size;
        let y = rng.random::<f64>() * parameters.grid_size;
        let protected =
            kind == LocationKind::Household && rng.random_bool(parameters.bed_net_coverage);
        world.add_location(kind, x, y, protected);
    }
}

/// Builds the initial world.
///
/// # Errors
///
/// If an agent cannot be placed at its initial location.
pub fn build_world<R: Rng + ?Sized>(
    parameters: &Parameters,
    rng: &mut R,
) -> Result<World, MalariaError> {
    let mut world = World::new(parameters.max_occupants);
    add_locations(
        &mut world,
        LocationKind::Household,
        parameters.num_households,
        parameters,
        rng,
    );
    add_locations(
        &mut world,
        LocationKind::Workplace,
        parameters.num_workplaces,
        parameters,
        rng,
    );
    add_locations(
        &mut world,
        LocationKind::BreedingSite,
        parameters.num_breeding_sites,
        parameters,
        rng,
    );

    let (min_age, max_age) = parameters.human_age_range;
    for index in 0..parameters.num_humans {
        let age = rng.random_range(min_age..=max_age);
        let home = LocationId::new(
            LocationKind::Household,
            rng.random_range(0..parameters.num_households),
        );
        let work = LocationId::new(
            LocationKind::Workplace,
            rng.random_range(0..parameters.num_workplaces),
        );
        let id = world.add_human(age, home, work)?;
        let human = world.human_mut(id);
        // Enrolled before the run starts, so there is no treatment day.
        human.under_treatment = rng.random_bool(parameters.treatment_rate);
        if index < parameters.initial_infectious_humans {
            human.infect(0);
        }
    }

    let (min_age, max_age) = parameters.mosquito_age_range;
    for index in 0..parameters.num_mosquitoes {
        let age = rng.random_range(min_age..=max_age);
        let site = LocationId::new(
            LocationKind::BreedingSite,
            rng.random_range(0..parameters.num_breeding_sites),
        );
        let id = world.add_mosquito(age, site)?;
        if index < parameters.initial_infectious_mosquitoes {
            world.mosquito_mut(id).state = MosquitoState::Infectious;
        }
    }

    Ok(world)
}

/// Builds the world from the context's parameters and stores it.
///
/// # Errors
///
/// If the world cannot be built.
pub fn init(context: &mut Context) -> Result<(), MalariaError> {
    let parameters = context.get_params().clone();
    let world = context.sample(SetupRng, |rng| build_world(&parameters, rng))?;
    {
        let locations = world.locations();
        let protected = locations
            .locations(LocationKind::Household)
            .iter()
            .filter(|house| house.is_protected())
            .count();
        info!(
            "built world: {} households ({protected} protected), {} workplaces, {} breeding sites",
            locations.len(LocationKind::Household),
            locations.len(LocationKind::Workplace),
            locations.len(LocationKind::BreedingSite)
        );
        info!(
            "{} humans, {} mosquitoes",
            world.humans().len(),
            world.mosquitoes().len()
        );
    }
    context.set_world(world);
    Ok(())
}
