//! Model parameters.
//!
//! `Parameters` is loaded from JSON (any field may be omitted, in which case the default
//! applies), overridden from the command line, validated, and then stored in the `Context`
//! where every manager reads it through `ContextParametersExt::get_params`.
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::MalariaError;

/// Temperature at which mosquitoes bite at their baseline rate.
pub const NEUTRAL_TEMPERATURE: f64 = 22.0;
pub const MIN_TEMPERATURE: f64 = 0.0;
pub const MAX_TEMPERATURE: f64 = 45.0;
const BITING_FACTOR_SLOPE: f64 = 0.05;
const MIN_BITING_FACTOR: f64 = 0.5;
const MAX_BITING_FACTOR: f64 = 1.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    pub num_households: usize,
    pub num_workplaces: usize,
    pub num_breeding_sites: usize,
    pub num_humans: usize,
    /// Fixed number of mosquito slots. Dead slots are revived, never added.
    pub num_mosquitoes: usize,
    pub days: u32,
    /// Occupancy capacity of every location.
    pub max_occupants: usize,
    /// Side of the square domain locations are placed in.
    pub grid_size: f64,
    /// Decay constant of the `exp(-decay * distance)` destination weight.
    pub distance_decay: f64,
    pub daily_biting_prob: f64,
    pub mosquito_to_human_prob: f64,
    pub human_to_mosquito_prob: f64,
    pub human_recovery_prob: f64,
    pub recovery_delay_days: u32,
    pub treatment_recovery_multiplier: f64,
    pub human_mortality: f64,
    pub mosquito_mortality: f64,
    pub extrinsic_incubation_days: u32,
    pub mosquito_move_chance: f64,
    /// Probability that a household is protected by bed nets.
    pub bed_net_coverage: f64,
    pub bed_net_efficacy: f64,
    pub bed_net_kill_prob: f64,
    pub treatment_rate: f64,
    /// Reduction of a treated human's infectivity to mosquitoes.
    pub treatment_effect: f64,
    pub initial_infectious_humans: usize,
    pub initial_infectious_mosquitoes: usize,
    /// Minimum live mosquito population kept by daily replenishment.
    pub mosquito_floor: usize,
    pub human_age_range: (u32, u32),
    pub mosquito_age_range: (u32, u32),
    /// Ambient temperature in °C.
    pub temperature: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            num_households: 100,
            num_workplaces: 20,
            num_breeding_sites: 50,
            num_humans: 10_000,
            num_mosquitoes: 10_000,
            days: 500,
            max_occupants: 2000,
            grid_size: 100.0,
            distance_decay: 0.1,
            daily_biting_prob: 0.3,
            mosquito_to_human_prob: 0.2,
            human_to_mosquito_prob: 0.1,
            human_recovery_prob: 1.0 / 14.0,
            recovery_delay_days: 14,
            treatment_recovery_multiplier: 3.0,
            human_mortality: 0.0001,
            mosquito_mortality: 0.1,
            extrinsic_incubation_days: 10,
            mosquito_move_chance: 0.1,
            bed_net_coverage: 0.1,
            bed_net_efficacy: 0.7,
            bed_net_kill_prob: 0.3,
            treatment_rate: 0.1,
            treatment_effect: 0.5,
            initial_infectious_humans: 10,
            initial_infectious_mosquitoes: 100,
            mosquito_floor: 5000,
            human_age_range: (15, 60),
            mosquito_age_range: (1, 30),
            temperature: NEUTRAL_TEMPERATURE,
        }
    }
}

fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), MalariaError> {
    if value.is_nan() || value < min || value > max {
        return Err(MalariaError::ConfigOutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn check_count(
    name: &'static str,
    value: usize,
    min: usize,
    max: usize,
) -> Result<(), MalariaError> {
    check_range(name, value as f64, min as f64, max as f64)
}

impl Parameters {
    /// Rejects values outside their sane bounds.
    ///
    /// # Errors
    ///
    /// `ConfigOutOfRange` naming the first offending field.
    pub fn validate(&self) -> Result<(), MalariaError> {
        for (name, value) in [
            ("daily_biting_prob", self.daily_biting_prob),
            ("mosquito_to_human_prob", self.mosquito_to_human_prob),
            ("human_to_mosquito_prob", self.human_to_mosquito_prob),
            ("human_recovery_prob", self.human_recovery_prob),
            ("human_mortality", self.human_mortality),
            ("mosquito_mortality", self.mosquito_mortality),
            ("mosquito_move_chance", self.mosquito_move_chance),
            ("bed_net_coverage", self.bed_net_coverage),
            ("bed_net_efficacy", self.bed_net_efficacy),
            ("bed_net_kill_prob", self.bed_net_kill_prob),
            ("treatment_rate", self.treatment_rate),
            ("treatment_effect", self.treatment_effect),
        ] {
            check_range(name, value, 0.0, 1.0)?;
        }
        check_range(
            "temperature",
            self.temperature,
            MIN_TEMPERATURE,
            MAX_TEMPERATURE,
        )?;
        check_range("grid_size", self.grid_size, f64::MIN_POSITIVE, f64::MAX)?;
        check_range("distance_decay", self.distance_decay, 0.0, f64::MAX)?;
        check_range(
            "treatment_recovery_multiplier",
            self.treatment_recovery_multiplier,
            0.0,
            f64::MAX,
        )?;

        check_count("num_households", self.num_households, 1, usize::MAX)?;
        check_count("num_workplaces", self.num_workplaces, 1, usize::MAX)?;
        check_count("num_breeding_sites", self.num_breeding_sites, 1, usize::MAX)?;
        check_count("max_occupants", self.max_occupants, 1, usize::MAX)?;
        check_count(
            "initial_infectious_humans",
            self.initial_infectious_humans,
            0,
            self.num_humans,
        )?;
        check_count(
            "initial_infectious_mosquitoes",
            self.initial_infectious_mosquitoes,
            0,
            self.num_mosquitoes,
        )?;
        check_count("mosquito_floor", self.mosquito_floor, 0, self.num_mosquitoes)?;

        for (name, (min, max)) in [
            ("human_age_range", self.human_age_range),
            ("mosquito_age_range", self.mosquito_age_range),
        ] {
            check_range(name, f64::from(min), 0.0, f64::from(max))?;
        }
        Ok(())
    }

    /// Multiplier applied to the daily biting probability at the configured temperature.
    /// Non-decreasing in temperature and capped at both ends.
    #[must_use]
    pub fn biting_factor(&self) -> f64 {
        (1.0 + (self.temperature - NEUTRAL_TEMPERATURE) * BITING_FACTOR_SLOPE)
            .clamp(MIN_BITING_FACTOR, MAX_BITING_FACTOR)
    }

    /// Probability that a mosquito bites in a given hour.
    #[must_use]
    pub fn hourly_biting_prob(&self) -> f64 {
        (self.daily_biting_prob * self.biting_factor()).min(1.0) / 24.0
    }

    /// Recovery probability for an infectious human past the recovery delay.
    #[must_use]
    pub fn recovery_prob(&self, under_treatment: bool) -> f64 {
        if under_treatment {
            (self.human_recovery_prob * self.treatment_recovery_multiplier).min(1.0)
        } else {
            self.human_recovery_prob
        }
    }
}

/// Reads parameters from a JSON file. Omitted fields take their defaults.
///
/// # Errors
///
/// If the file cannot be opened or parsed, or if a value is out of range.
pub fn load_parameters_from_json(path: &Path) -> Result<Parameters, MalariaError> {
    info!("loading parameters from {}", path.display());
    let reader = BufReader::new(File::open(path)?);
    let parameters: Parameters = serde_json::from_reader(reader)?;
    parameters.validate()?;
    Ok(parameters)
}

define_data_plugin!(ParametersPlugin, Option<Parameters>, None);

pub trait ContextParametersExt {
    /// Validates and stores the parameters used by every manager.
    ///
    /// # Errors
    ///
    /// `ConfigOutOfRange` if a value is out of range; the stored parameters are unchanged.
    fn set_params(&mut self, parameters: Parameters) -> Result<(), MalariaError>;

    /// # Panics
    ///
    /// If `set_params` has not been called.
    fn get_params(&self) -> &Parameters;
}

impl ContextParametersExt for Context {
    fn set_params(&mut self, parameters: Parameters) -> Result<(), MalariaError> {
        if let Err(e) = parameters.validate() {
            warn!("rejected parameters: {e}");
            return Err(e);
        }
        *self.get_data_mut(ParametersPlugin) = Some(parameters);
        Ok(())
    }

    fn get_params(&self) -> &Parameters {
        self.try_get_data(ParametersPlugin)
            .and_then(Option::as_ref)
            .expect("parameters have not been set")
    }
}
