//! Wiring of the model managers into a `Context`.
use log::info;

use crate::context::{Context, ExecutionPhase};
use crate::error::MalariaError;
use crate::parameters::ContextParametersExt;
use crate::{disease, movement, replenishment, setup, statistics, transmission};

/// Builds the world and registers every manager. Parameters and the random seed must be set.
///
/// The shutdown plan is registered first so that it runs ahead of the hourly plans that
/// share its timestamp: a run of `days` days executes hours `0..24 * days`.
///
/// # Errors
///
/// If the initial world cannot be built.
pub fn init(context: &mut Context) -> Result<(), MalariaError> {
    let days = context.get_params().days;
    context.add_plan_with_phase(f64::from(days), Context::shutdown, ExecutionPhase::First);

    setup::init(context)?;
    movement::init(context);
    transmission::init(context);
    // Same timestamp and phase: these run in registration order at the end of each day.
    disease::init(context);
    replenishment::init(context);
    statistics::init(context);

    info!("simulation initialized for {days} days");
    Ok(())
}
