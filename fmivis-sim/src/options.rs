use std::path::PathBuf;

use clap::{Args, Parser};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use fmivis::settings::{SimOptions, Solver, StatusPolicy};

/// Simulate an FMU the way the visualizer does, without a scene
#[derive(Parser, Debug)]
#[command(name = "fmivis-sim", version, about)]
pub struct Cli {
    /// The FMU model to simulate
    #[arg(value_name = "MODEL.FMU")]
    pub model: PathBuf,

    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    #[command(flatten)]
    pub sim: SimArgs,

    /// Visualization step size [s]
    #[arg(long, default_value_t = 0.1)]
    pub vis_step: f64,

    /// Directory FMUs are extracted into (default: a temporary directory)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Divisor for raw joystick axis values
    #[arg(long, default_value_t = fmivis::input::DEFAULT_AXIS_SCALE)]
    pub axis_scale: f64,

    /// Variable to print at every visualization step, can be specified multiple times
    #[arg(long, value_name = "NAME")]
    pub watch: Vec<String>,

    /// Only print model information and variable counts
    #[arg(long)]
    pub check: bool,
}

#[derive(Args, Debug, Default)]
pub struct SimArgs {
    /// Start time [s] (default: from the model, or 0)
    #[arg(long)]
    pub start_time: Option<f64>,

    /// Stop time [s] (default: from the model, or 1)
    #[arg(long)]
    pub stop_time: Option<f64>,

    /// Integrator step size [s] (default: from the model, or 1/500 of the interval)
    #[arg(long)]
    pub step_size: Option<f64>,

    /// Relative tolerance handed to the FMU
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Integration scheme
    #[arg(long, default_value_t = Solver::ForwardEuler)]
    pub solver: Solver,

    /// Fail on the first FMI error instead of logging it and continuing
    #[arg(long)]
    pub strict: bool,

    /// Let the FMU return intermediate results during event iteration
    #[arg(long)]
    pub intermediate_results: bool,

    /// Enable the FMU's debug logging
    #[arg(long)]
    pub fmu_logging: bool,
}

impl From<&SimArgs> for SimOptions {
    fn from(args: &SimArgs) -> Self {
        SimOptions {
            start_time: args.start_time,
            stop_time: args.stop_time,
            step_size: args.step_size,
            tolerance: args.tolerance,
            solver: args.solver,
            status_policy: if args.strict {
                StatusPolicy::Strict
            } else {
                StatusPolicy::Tolerant
            },
            intermediate_results: args.intermediate_results,
            fmu_logging: args.fmu_logging,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from([
            "fmivis-sim",
            "ball.fmu",
            "--stop-time",
            "3",
            "--strict",
            "--watch",
            "h",
            "--watch",
            "v",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.model, PathBuf::from("ball.fmu"));
        assert_eq!(cli.watch, ["h", "v"]);
        assert_eq!(cli.vis_step, 0.1);
        assert_eq!(cli.verbose.log_level_filter(), log::LevelFilter::Trace);

        let options = SimOptions::from(&cli.sim);
        assert_eq!(options.stop_time, Some(3.0));
        assert_eq!(options.start_time, None);
        assert_eq!(options.status_policy, StatusPolicy::Strict);
        assert_eq!(options.solver, Solver::ForwardEuler);
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
