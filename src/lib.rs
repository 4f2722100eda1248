//! An agent-based simulation of malaria transmission.
//!
//! Humans commute between a household and a workplace; mosquitoes move between households,
//! workplaces and breeding sites. Every hour, co-located mosquitoes bite humans and may pass
//! the parasite in either direction. At the end of every day infections progress, agents
//! die, the mosquito population is topped up and a snapshot of the world is recorded.
//!
//! The simulation is driven by a `Context` that is responsible for:
//! * Maintaining a notion of time (in days) and executing scheduled plans in order
//! * Holding module-specific data so that the module and other modules can access it
//! * Delivering events, such as the daily snapshot, to subscribers
//!
//! The model itself is a set of modules, each registering its plans on the `Context`:
//! * `setup` builds the locations and the initial population.
//! * `movement` relocates every agent at the start of each hour.
//! * `transmission` resolves bites between co-located mosquitoes and humans.
//! * `disease` advances infections and applies mortality once a day.
//! * `replenishment` revives dead mosquitoes to keep the population above a floor.
//! * `statistics` records the daily snapshot, which `reports` writes to CSV.
pub mod clock;
pub mod context;
pub mod destination;
pub mod disease;
pub mod error;
pub mod execution_stats;
pub mod hashing;
pub mod log;
pub mod movement;
pub mod parameters;
pub mod plan;
#[cfg(feature = "progress_bar")]
pub mod progress;
pub mod random;
pub mod replenishment;
pub mod report;
pub mod reports;
pub mod runner;
pub mod setup;
pub mod simulation;
pub mod statistics;
pub mod transmission;
pub mod world;

pub use context::{Context, ExecutionPhase};
pub use error::MalariaError;
pub use hashing::{HashMap, HashMapExt};
pub use parameters::{ContextParametersExt, Parameters};
pub use random::ContextRandomExt;
pub use statistics::{ContextStatisticsExt, DailySnapshot};
pub use world::{ContextWorldExt, World};

// Re-exported for use in macros.
pub use csv;
pub use rand;
