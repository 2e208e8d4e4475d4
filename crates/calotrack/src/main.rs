//! calotrack command line
//!
//! Resolves task configurations, wires them into an in-memory manager and
//! prints the result as a summary or as JSON.

use anyhow::{Context, Result};
use calotrack::balance::{add_task_balance_eff_cont, BalanceEffContOptions, ParticleSpecies};
use calotrack::compose::{add_task_calo_track_corr_base, registered_name, Collaborators};
use calotrack::config::{load_balance_options, load_flags_file};
use calotrack::manager::{AnalysisManager, ManagerGraph, RegisteredTask};
use calotrack_logging::{init_logging, LogConfig};
use calotrack_protocol::{
    Calorimeter, CentralityRange, CollisionSystem, DataKind, InputFlags, TriggerMask,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "calotrack",
    about = "Configure calorimeter/track correlation analysis tasks"
)]
struct Cli {
    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configure the correlation base task and wire it into a manager
    CaloTrackCorr {
        #[command(flatten)]
        flags: FlagArgs,

        #[command(flatten)]
        manager: ManagerArgs,

        /// Print task and wiring as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the artifact name only
    Name {
        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Configure the balance-function efficiency/contamination task
    BalanceEffCont {
        #[command(flatten)]
        options: BalanceArgs,

        #[command(flatten)]
        manager: ManagerArgs,

        /// Print task and wiring as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Task flags. Values given here override the flags file.
#[derive(Args, Debug, Default)]
struct FlagArgs {
    /// TOML file with base flags
    #[arg(long)]
    flags_file: Option<PathBuf>,

    /// EMCAL, DCAL or PHOS
    #[arg(long)]
    calorimeter: Option<String>,

    #[arg(long, action = clap::ArgAction::Set)]
    simulation: Option<bool>,

    #[arg(long)]
    year: Option<i32>,

    /// pp, PbPb or pA
    #[arg(long)]
    collision: Option<String>,

    #[arg(long)]
    reject_emc_trigger: Option<i32>,

    #[arg(long)]
    clusters_array: Option<String>,

    /// Cut tokens, e.g. "Smearing" or "SPDPileUp"
    #[arg(long)]
    cuts: Option<String>,

    #[arg(long, action = clap::ArgAction::Set)]
    calibrate: Option<bool>,

    #[arg(long, action = clap::ArgAction::Set)]
    non_linearity: Option<bool>,

    #[arg(long, allow_hyphen_values = true)]
    min_cen: Option<i32>,

    #[arg(long, allow_hyphen_values = true)]
    max_cen: Option<i32>,

    #[arg(long, action = clap::ArgAction::Set)]
    mixing: Option<bool>,

    #[arg(long)]
    output_file: Option<String>,

    #[arg(long, action = clap::ArgAction::Set)]
    print_settings: Option<bool>,

    #[arg(long)]
    debug: Option<i32>,

    /// Abbreviated trigger class, e.g. EMC7, EMCAL_L1, INT7
    #[arg(long)]
    trigger: Option<String>,
}

impl FlagArgs {
    fn resolve(&self) -> Result<InputFlags> {
        let mut flags = match &self.flags_file {
            Some(path) => load_flags_file(path)?,
            None => InputFlags::default(),
        };

        if let Some(calorimeter) = &self.calorimeter {
            flags.calorimeter = Calorimeter::parse_lenient(calorimeter);
        }
        if let Some(simulation) = self.simulation {
            flags.simulation = simulation;
        }
        if let Some(year) = self.year {
            flags.year = year;
        }
        if let Some(collision) = &self.collision {
            flags.collision = CollisionSystem::parse_lenient(collision);
        }
        if let Some(reject) = self.reject_emc_trigger {
            flags.reject_emc_trigger = reject;
        }
        if let Some(clusters) = &self.clusters_array {
            flags.clusters_array = clusters.clone();
        }
        if let Some(cuts) = &self.cuts {
            flags.cuts = cuts.clone();
        }
        if let Some(calibrate) = self.calibrate {
            flags.calibrate = calibrate;
        }
        if let Some(non_linearity) = self.non_linearity {
            flags.non_linearity = non_linearity;
        }
        if self.min_cen.is_some() || self.max_cen.is_some() {
            flags.centrality = CentralityRange::new(
                self.min_cen.unwrap_or(flags.centrality.min),
                self.max_cen.unwrap_or(flags.centrality.max),
            );
        }
        if let Some(mixing) = self.mixing {
            flags.mixing = mixing;
        }
        if let Some(output_file) = &self.output_file {
            flags.output_file = output_file.clone();
        }
        if let Some(print_settings) = self.print_settings {
            flags.print_settings = print_settings;
        }
        if let Some(debug) = self.debug {
            flags.debug = debug;
        }
        if let Some(trigger) = &self.trigger {
            flags.trigger = trigger.clone();
        }
        Ok(flags)
    }
}

/// Shape of the in-memory execution manager.
#[derive(Args, Debug)]
struct ManagerArgs {
    /// Data kind delivered by the input handler
    #[arg(long, env = "CALOTRACK_DATA_KIND", default_value = "AOD")]
    data_kind: String,

    /// Attach a Monte Carlo truth handler
    #[arg(long)]
    mc_truth: bool,

    /// Run without an input event handler
    #[arg(long)]
    no_input_handler: bool,

    /// Common output file of the manager
    #[arg(long)]
    common_file: Option<String>,
}

impl ManagerArgs {
    fn build(&self) -> ManagerGraph {
        let graph = if self.no_input_handler {
            ManagerGraph::without_input_handler()
        } else {
            ManagerGraph::new(DataKind::parse_lenient(&self.data_kind))
        };
        let graph = graph.with_mc_truth(self.mc_truth);
        match &self.common_file {
            Some(file) => graph.with_common_file(file.clone()),
            None => graph,
        }
    }
}

#[derive(Args, Debug)]
struct BalanceArgs {
    /// TOML file with base options
    #[arg(long)]
    options_file: Option<PathBuf>,

    /// Centrality estimator, empty disables the selection
    #[arg(long)]
    centrality_estimator: Option<String>,

    #[arg(long)]
    centrality_min: Option<f64>,

    #[arg(long)]
    centrality_max: Option<f64>,

    #[arg(long)]
    vertex_z: Option<f64>,

    #[arg(long)]
    aod_filter_bit: Option<u32>,

    #[arg(long)]
    file_name_base: Option<String>,

    /// Offline trigger bit mask
    #[arg(long)]
    trigger_mask: Option<u32>,

    #[arg(long, action = clap::ArgAction::Set)]
    use_pid: Option<bool>,

    #[arg(long, action = clap::ArgAction::Set)]
    use_pid_nsigma_combination: Option<bool>,

    #[arg(long)]
    bayes_threshold: Option<f64>,

    /// electron, muon, pion, kaon or proton
    #[arg(long)]
    particle: Option<ParticleSpecies>,
}

impl BalanceArgs {
    fn resolve(&self) -> Result<BalanceEffContOptions> {
        let mut options = match &self.options_file {
            Some(path) => load_balance_options(path)?,
            None => BalanceEffContOptions::default(),
        };
        if let Some(estimator) = &self.centrality_estimator {
            options.centrality_estimator = estimator.clone();
        }
        if let Some(min) = self.centrality_min {
            options.centrality_min = min;
        }
        if let Some(max) = self.centrality_max {
            options.centrality_max = max;
        }
        if let Some(vertex_z) = self.vertex_z {
            options.vertex_z = vertex_z;
        }
        if let Some(bit) = self.aod_filter_bit {
            options.aod_filter_bit = bit;
        }
        if let Some(base) = &self.file_name_base {
            options.file_name_base = base.clone();
        }
        if let Some(mask) = self.trigger_mask {
            options.trigger = TriggerMask::new(mask);
        }
        if let Some(use_pid) = self.use_pid {
            options.use_pid = use_pid;
        }
        if let Some(combination) = self.use_pid_nsigma_combination {
            options.use_pid_nsigma_combination = combination;
        }
        if let Some(threshold) = self.bayes_threshold {
            options.bayes_threshold = threshold;
        }
        if let Some(particle) = self.particle {
            options.particle = particle;
        }
        Ok(options)
    }
}

#[derive(Serialize)]
struct WiringReport<'a, T: Serialize> {
    task: &'a RegisteredTask<T>,
    manager: &'a ManagerGraph,
}

impl Commands {
    fn wants_json(&self) -> bool {
        match self {
            Commands::CaloTrackCorr { json, .. } | Commands::BalanceEffCont { json, .. } => *json,
            Commands::Name { .. } => false,
        }
    }

    fn debug_hint(&self) -> i32 {
        match self {
            Commands::CaloTrackCorr { flags, .. } | Commands::Name { flags } => {
                flags.debug.unwrap_or(0)
            }
            Commands::BalanceEffCont { .. } => 0,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn print_wiring(manager: &ManagerGraph) {
    for record in manager.tasks() {
        println!("Task: {}", record.name);
        for (slot, container) in &record.inputs {
            if let Some(c) = manager.container(*container) {
                println!("  input  {} <- {}", slot, c.name);
            }
        }
        for (slot, container) in &record.outputs {
            if let Some(c) = manager.container(*container) {
                println!(
                    "  output {} -> {} [{}] {}",
                    slot,
                    c.name,
                    c.kind,
                    c.file.as_deref().unwrap_or("")
                );
            }
        }
    }
}

fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::CaloTrackCorr {
            flags,
            manager,
            json,
        } => {
            let flags = flags.resolve()?;
            let mut graph = manager.build();
            let registered = add_task_calo_track_corr_base(
                Some(&mut graph as &mut dyn AnalysisManager),
                &flags,
                &Collaborators::reference(),
            )?;
            if json {
                print_json(&WiringReport {
                    task: &registered,
                    manager: &graph,
                })?;
            } else {
                println!("Name:    {}", registered.task.name);
                println!("Trigger: {:?}", registered.task.trigger);
                print_wiring(&graph);
            }
        }
        Commands::Name { flags } => {
            let flags = flags.resolve()?;
            println!(
                "{}",
                registered_name(&flags, Collaborators::reference().production)
            );
        }
        Commands::BalanceEffCont {
            options,
            manager,
            json,
        } => {
            let options = options.resolve()?;
            let mut graph = manager.build();
            let registered = add_task_balance_eff_cont(
                Some(&mut graph as &mut dyn AnalysisManager),
                &options,
            )?;
            if json {
                print_json(&WiringReport {
                    task: &registered,
                    manager: &graph,
                })?;
            } else {
                println!("Analysis type: {:?}", registered.task.analysis_type);
                print_wiring(&graph);
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = cli.command.wants_json();

    if let Err(err) = init_logging(LogConfig {
        app_name: "calotrack",
        verbose: cli.verbose,
        debug_level: cli.command.debug_hint(),
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    match run_command(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                println!("{}", serde_json::json!({ "error": format!("{:#}", err) }));
            } else {
                eprintln!("Error: {:?}", err);
            }
            ExitCode::from(1)
        }
    }
}
