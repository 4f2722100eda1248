//! Command-line entry point: parse arguments, configure, run, report.
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

use clap::{Args, Command, FromArgMatches as _};
use log::{info, LevelFilter};

use crate::clock::ContextClockExt;
use crate::context::{Context, ExecutionPhase};
use crate::error::MalariaError;
use crate::execution_stats::{
    log_execution_statistics, print_execution_statistics, ExecutionProfilingCollector,
};
use crate::parameters::{load_parameters_from_json, ContextParametersExt, Parameters};
use crate::random::ContextRandomExt;
use crate::report::ContextReportExt;
use crate::world::ContextWorldExt;
use crate::{reports, simulation};

/// Default command-line arguments of the simulator
#[derive(Args, Debug, Default)]
pub struct BaseArgs {
    /// Random seed
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Optional path to a JSON parameters file
    #[arg(short, long, default_value = "")]
    pub config: String,

    /// Optional path for report output
    #[arg(short, long, default_value = "")]
    pub output_dir: String,

    /// Optional prefix for report file names
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Replace existing report files
    #[arg(short, long)]
    pub force_overwrite: bool,

    /// Enable logging at the given level (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Number of days to simulate, overriding the configuration
    #[arg(long)]
    pub days: Option<u32>,

    /// Ambient temperature in °C, overriding the configuration
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Do not print execution statistics
    #[arg(long)]
    pub no_stats: bool,

    /// Show a progress bar over simulated days
    #[cfg(feature = "progress_bar")]
    #[arg(long)]
    pub progress: bool,
}

fn create_cli() -> Command {
    let cli = Command::new("malaria-sim")
        .about("Agent-based simulation of malaria transmission between humans and mosquitoes");
    BaseArgs::augment_args(cli)
}

/// Runs a simulation configured from the process's command-line arguments.
///
/// # Errors
///
/// If the arguments cannot be parsed, the configuration is invalid, a report file cannot
/// be created, or the run fails.
pub fn run_with_args() -> Result<Context, Box<dyn std::error::Error>> {
    let matches = create_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)?;
    Ok(run_with_args_internal(args)?)
}

/// Applies command-line overrides over the file or default parameters.
fn resolve_parameters(args: &BaseArgs) -> Result<Parameters, MalariaError> {
    let mut parameters = if args.config.is_empty() {
        Parameters::default()
    } else {
        load_parameters_from_json(Path::new(&args.config))?
    };
    if let Some(days) = args.days {
        parameters.days = days;
    }
    if let Some(temperature) = args.temperature {
        parameters.temperature = temperature;
    }
    parameters.validate()?;
    Ok(parameters)
}

fn configure_logging(log_level: Option<&str>) -> Result<(), MalariaError> {
    if let Some(level) = log_level {
        let level = LevelFilter::from_str(level)
            .map_err(|_| MalariaError::MalariaError(format!("unknown log level `{level}`")))?;
        crate::log::set_log_level(level);
    }
    Ok(())
}

pub(crate) fn run_with_args_internal(args: BaseArgs) -> Result<Context, MalariaError> {
    configure_logging(args.log_level.as_deref())?;
    let parameters = resolve_parameters(&args)?;
    let days = parameters.days;

    let mut context = Context::new();
    context.init_random(args.random_seed);
    context.set_params(parameters)?;

    let report_config = context.report_options();
    if !args.output_dir.is_empty() {
        report_config.directory(PathBuf::from(&args.output_dir));
    }
    report_config
        .file_prefix(args.prefix.clone())
        .overwrite(args.force_overwrite);

    let collector = Rc::new(RefCell::new(ExecutionProfilingCollector::new()));
    simulation::init(&mut context)?;
    reports::init(&mut context)?;
    {
        let collector = Rc::clone(&collector);
        context.add_daily_plan(ExecutionPhase::Last, move |_| collector.borrow_mut().refresh());
    }

    #[cfg(feature = "progress_bar")]
    if args.progress {
        crate::progress::init_timeline_progress_bar(f64::from(days));
    }

    info!("starting simulation with seed {}", args.random_seed);
    context.execute();
    if let Some(failure) = context.take_failure() {
        return Err(failure);
    }

    let (agents, capacity_drops) = {
        let world = context.world();
        (
            world.humans().len() + world.mosquitoes().len(),
            world.locations().capacity_drops(),
        )
    };
    let mut stats = collector.borrow_mut().compute_final_statistics(agents, days);
    stats.capacity_drops = capacity_drops;
    log_execution_statistics(&stats);
    if !args.no_stats {
        print_execution_statistics(&stats);
    }

    // The run itself completed; lost report rows still make the output incomplete.
    let write_failures = context.report_write_failures();
    if write_failures > 0 {
        return Err(MalariaError::ReportError(format!(
            "{write_failures} report rows could not be written"
        )));
    }
    Ok(context)
}
