#![doc = include_str!("../README.md")]
#![deny(clippy::all)]

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use comfy_table::Table;
use fmivis::{
    driver::IntegrationDriver,
    handle::FmuHandle,
    import::{self, ExtractCache},
    input::InputConfig,
    logging::LogConfig,
    settings::{SimOptions, SimulationSettings},
    time::{PlaybackMode, TimeManager},
    visual::{self, AttributeBinding, Shape},
};
use itertools::Itertools;

pub mod options;

use options::Cli;

pub fn entrypoint() -> anyhow::Result<()> {
    entrypoint_from(std::env::args_os())
}

pub fn entrypoint_from<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    // FMU messages are switched on at instantiation through `--fmu-logging`
    let log_config = LogConfig::from(cli.verbose.log_level_filter());
    let _logger = flexi_logger::Logger::try_with_env_or_str(log_config.spec())?
        .set_palette("b1;3;2;4;6".to_string())
        .start()?;

    let mut cache = match &cli.cache_dir {
        Some(dir) => ExtractCache::with_dir(dir)?,
        None => ExtractCache::new()?,
    };
    let fmu = import::load(&cli.model, &mut cache)
        .with_context(|| format!("Loading {}", cli.model.display()))?;

    if cli.check {
        println!("{}", check_report(&*fmu));
        return Ok(());
    }

    run(&cli, fmu)
}

/// Model information and the variable counts per variability, causality and base type.
pub fn check_report<F: FmuHandle + ?Sized>(fmu: &F) -> String {
    let experiment = fmu.default_experiment();
    let counts = fmu.model_counts();

    let mut table = Table::new();
    table.set_header(["Group", "Kind", "Count"]);
    for (group, kind, count) in counts.rows().into_iter().filter(|(_, _, count)| *count > 0) {
        table.add_row([group.to_owned(), kind.to_owned(), count.to_string()]);
    }

    let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_owned(), |v| v.to_string());
    format!(
        "Model: {}\nFMI version: {}\nContinuous states: {}\nEvent indicators: {}\nVariables: {}\n\
         Default experiment: start {}, stop {}, tolerance {}, step {}\n{table}",
        fmu.instance_name(),
        fmu.fmi_version(),
        fmu.num_states(),
        fmu.num_event_indicators(),
        counts.total(),
        fmt(experiment.start_time),
        fmt(experiment.stop_time),
        fmt(experiment.tolerance),
        fmt(experiment.step_size),
    )
}

fn run(cli: &Cli, fmu: Box<dyn FmuHandle>) -> anyhow::Result<()> {
    let options = SimOptions::from(&cli.sim);
    let settings = SimulationSettings::new_from_options(&options, &fmu.default_experiment())?;
    log::info!(
        "Simulating {} from {} to {} with h = {}",
        fmu.instance_name(),
        settings.start_time,
        settings.stop_time,
        settings.step_size
    );

    let mut time = TimeManager::from_settings(&settings, cli.vis_step, PlaybackMode::Live)?;
    let mut driver = IntegrationDriver::new();
    driver.set_input_config(InputConfig {
        axis_scale: cli.axis_scale,
        ..Default::default()
    });
    driver.load(fmu, settings);
    driver.initialize()?;

    // One shape per watched variable, bound through its length attribute
    let mut shapes = cli
        .watch
        .iter()
        .map(|name| {
            let mut shape = Shape::new(name.as_str(), "watch");
            shape.length = AttributeBinding::variable(name.as_str());
            shape
        })
        .collect_vec();
    let fmu = driver.fmu_mut().context("No model loaded")?;
    let unresolved = visual::set_var_references_each(&mut shapes, &**fmu);
    if unresolved > 0 {
        log::warn!("{unresolved} watched variables could not be resolved and read as 0");
    }

    let mut table = Table::new();
    table.set_header(std::iter::once("time".to_owned()).chain(cli.watch.iter().cloned()));
    visual::update_visual_attributes(&mut shapes, fmu)?;
    add_row(&mut table, time.vis_time(), &shapes);

    if time.start_visualization() {
        while !time.is_paused() {
            time.scene_update(&mut driver)?;
            if let Some(fmu) = driver.fmu_mut() {
                if let Err(err) = visual::update_visual_attributes(&mut shapes, fmu) {
                    log::warn!("Reading watched variables at t = {} failed: {err}", time.vis_time());
                }
            }
            add_row(&mut table, time.vis_time(), &shapes);
            log::debug!(
                "t = {:.6}, real time factor {:.2}",
                time.vis_time(),
                time.real_time_factor()
            );
        }
    }
    driver.terminate()?;

    if !cli.watch.is_empty() {
        println!("{table}");
    }

    let stats = driver.stats();
    println!(
        "Simulated to t = {} in {} steps: {} time events, {} state events, {} step events, {} tolerated errors",
        stats.end_time,
        stats.num_steps,
        stats.num_time_events,
        stats.num_state_events,
        stats.num_step_events,
        stats.num_soft_errors
    );
    if let Some(err) = stats.last_error {
        println!("Last tolerated error: {err}");
    }

    Ok(())
}

fn add_row(table: &mut Table, t: f64, shapes: &[Shape]) {
    table.add_row(
        std::iter::once(format!("{t:.6}"))
            .chain(shapes.iter().map(|shape| format!("{:.6}", shape.length.value()))),
    );
}
