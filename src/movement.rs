//! Hourly movement of every live agent.
//!
//! Humans follow a fixed commute: at work from 08:00 to 17:59, at home otherwise.
//! Mosquitoes in a protected household are driven out to a random breeding site. Any other
//! mosquito moves with a small hourly probability, toward households or workplaces at night
//! and toward breeding sites by day.
use log::{debug, trace};
use rand::Rng;

use crate::clock::{is_night_hour, is_working_hour, ContextClockExt};
use crate::context::{Context, ExecutionPhase};
use crate::define_rng;
use crate::destination::{random_location, select_destination};
use crate::error::MalariaError;
use crate::parameters::{ContextParametersExt, Parameters};
use crate::random::ContextRandomExt;
use crate::world::{ContextWorldExt, HumanId, LocationKind, MosquitoId, World};

define_rng!(MovementRng);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MovementSummary {
    pub humans_moved: usize,
    pub mosquitoes_moved: usize,
    /// Mosquitoes driven out of protected households.
    pub evictions: usize,
}

/// Moves every live human, then every live mosquito, in ascending id order.
///
/// # Errors
///
/// If an agent refers to a location that does not exist.
pub fn move_agents<R: Rng + ?Sized>(
    world: &mut World,
    parameters: &Parameters,
    hour_of_day: u32,
    rng: &mut R,
) -> Result<MovementSummary, MalariaError> {
    let mut summary = MovementSummary::default();
    let working = is_working_hour(hour_of_day);

    for index in 0..world.humans().len() {
        let human = &world.humans()[index];
        if !human.is_alive() {
            continue;
        }
        let target = if working { human.work() } else { human.home() };
        if world.move_human(HumanId(index), target)? {
            summary.humans_moved += 1;
        }
    }

    for index in 0..world.mosquitoes().len() {
        let mosquito = &world.mosquitoes()[index];
        if !mosquito.is_alive() {
            continue;
        }
        let id = MosquitoId(index);
        let current = mosquito.location();

        if current.kind == LocationKind::Household
            && world.locations().lookup(current)?.is_protected()
        {
            let site = random_location(world.locations(), LocationKind::BreedingSite, rng)?;
            trace!("mosquito {index} driven out of {current} to {site}");
            world.move_mosquito(id, site)?;
            summary.evictions += 1;
            continue;
        }

        if !rng.random_bool(parameters.mosquito_move_chance) {
            continue;
        }
        let kind = if is_night_hour(hour_of_day) {
            if rng.random_bool(0.5) {
                LocationKind::Household
            } else {
                LocationKind::Workplace
            }
        } else {
            LocationKind::BreedingSite
        };
        let destination = select_destination(
            world.locations(),
            current,
            kind,
            parameters.distance_decay,
            rng,
        )?;
        if destination != current && world.move_mosquito(id, destination)? {
            summary.mosquitoes_moved += 1;
        }
    }
    Ok(summary)
}

/// Registers hourly movement. Runs before transmission in every hour.
pub fn init(context: &mut Context) {
    context.add_hourly_plan(ExecutionPhase::First, |context| {
        let hour_of_day = context.hour_of_day();
        let result = {
            let parameters = context.get_params();
            let mut world = context.world_mut();
            context.sample(MovementRng, |rng| {
                move_agents(&mut world, parameters, hour_of_day, rng)
            })
        };
        match result {
            Ok(summary) => debug!(
                "hour {}: {} humans moved, {} mosquitoes moved, {} evicted",
                context.current_hour(),
                summary.humans_moved,
                summary.mosquitoes_moved,
                summary.evictions
            ),
            Err(e) => context.fail(e),
        }
    });
}
