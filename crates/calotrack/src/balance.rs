//! Balance-function efficiency and contamination task.

use blake3::Hasher;
use calotrack_protocol::{ContainerKind, DataKind, TriggerMask};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{error, info};

use crate::error::ComposeError;
use crate::manager::{wire_task, AnalysisManager, AnalysisTask, OutputSpec, RegisteredTask, Wiring};

pub const BALANCE_TASK_NAME: &str = "TaskEffContBF";
pub const BALANCE_OUTPUT_FOLDER: &str = "PWGCFEbyE.outputBalanceFunctionEffContAnalysis";
pub const INJECTED_SIGNAL_GENERATOR: &str = "Hijing";

/// Identified particle species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParticleSpecies {
    Electron,
    Muon,
    #[default]
    Pion,
    Kaon,
    Proton,
}

impl ParticleSpecies {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticleSpecies::Electron => "electron",
            ParticleSpecies::Muon => "muon",
            ParticleSpecies::Pion => "pion",
            ParticleSpecies::Kaon => "kaon",
            ParticleSpecies::Proton => "proton",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            ParticleSpecies::Electron => "e",
            ParticleSpecies::Muon => "mu",
            ParticleSpecies::Pion => "pi",
            ParticleSpecies::Kaon => "K",
            ParticleSpecies::Proton => "p",
        }
    }
}

impl fmt::Display for ParticleSpecies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ParticleSpecies {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "electron" | "e" => Ok(ParticleSpecies::Electron),
            "muon" | "mu" => Ok(ParticleSpecies::Muon),
            "pion" | "pi" => Ok(ParticleSpecies::Pion),
            "kaon" | "k" => Ok(ParticleSpecies::Kaon),
            "proton" | "p" => Ok(ParticleSpecies::Proton),
            _ => Err(format!(
                "Invalid particle species: '{}'. Expected: electron, muon, pion, kaon or proton",
                s
            )),
        }
    }
}

/// Caller options of the balance-function task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceEffContOptions {
    /// Empty disables the centrality selection
    pub centrality_estimator: String,
    pub centrality_min: f64,
    pub centrality_max: f64,
    pub vertex_z: f64,
    pub aod_filter_bit: u32,
    pub file_name_base: String,
    pub trigger: TriggerMask,
    pub use_pid: bool,
    pub use_pid_nsigma_combination: bool,
    pub bayes_threshold: f64,
    pub particle: ParticleSpecies,
}

impl Default for BalanceEffContOptions {
    fn default() -> Self {
        Self {
            centrality_estimator: "V0M".to_string(),
            centrality_min: 10.0,
            centrality_max: 80.0,
            vertex_z: 10.0,
            aod_filter_bit: 96,
            file_name_base: "AnalysisResults".to_string(),
            trigger: TriggerMask::INT7,
            use_pid: true,
            use_pid_nsigma_combination: true,
            bayes_threshold: 0.8,
            particle: ParticleSpecies::Pion,
        }
    }
}

impl BalanceEffContOptions {
    /// `<min>-<max>_<vz>` with no decimals.
    pub fn centrality_tag(&self) -> String {
        format!(
            "{:.0}-{:.0}_{:.0}",
            self.centrality_min, self.centrality_max, self.vertex_z
        )
    }

    /// `ch` for unidentified hadrons, else the species short name.
    pub fn pid_suffix(&self) -> &'static str {
        if self.use_pid {
            self.particle.short_name()
        } else {
            "ch"
        }
    }

    pub fn output_file(&self) -> String {
        format!("{}.root:{}", self.file_name_base, BALANCE_OUTPUT_FOLDER)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnalysisType {
    Esd,
    Aod,
    Mc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentralityWindow {
    pub estimator: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VertexDiamond {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Binning {
    pub min: f64,
    pub max: f64,
    pub bins: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PidSettings {
    pub particle: ParticleSpecies,
    pub nsigma_combination: bool,
    pub bayes_threshold: f64,
}

/// Configured balance-function task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceTaskDescriptor {
    pub name: String,
    pub fingerprint: String,
    pub analysis_type: AnalysisType,
    pub centrality: Option<CentralityWindow>,
    pub selection_mask: TriggerMask,
    pub vertex_diamond: VertexDiamond,
    pub rejected_generator: String,
    pub min_pt: f64,
    pub max_pt: f64,
    pub eta: Binning,
    pub delta_eta: Binning,
    pub pt: Binning,
    pub pid: Option<PidSettings>,
    pub aod_filter_bit: u32,
    pub wiring: Wiring,
}

impl AnalysisTask for BalanceTaskDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn settings(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn options_fingerprint(options: &BalanceEffContOptions) -> String {
    let canonical = serde_json::to_string(options).unwrap_or_default();
    let mut hasher = Hasher::new();
    hasher.update(canonical.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Build the task descriptor for a given analysis type.
pub fn build_balance_task(
    options: &BalanceEffContOptions,
    analysis_type: AnalysisType,
) -> BalanceTaskDescriptor {
    let tag = options.centrality_tag();
    let pid = options.pid_suffix();
    let file = options.output_file();

    let wiring = Wiring {
        input_slot: 0,
        outputs: vec![
            OutputSpec {
                slot: 1,
                name: format!("listQA_{}_{}", tag, pid),
                kind: ContainerKind::Output,
                file: file.clone(),
            },
            OutputSpec {
                slot: 2,
                name: format!("listEffContBF_{}_{}", tag, pid),
                kind: ContainerKind::Output,
                file,
            },
        ],
    };

    BalanceTaskDescriptor {
        name: BALANCE_TASK_NAME.to_string(),
        fingerprint: options_fingerprint(options),
        analysis_type,
        centrality: (!options.centrality_estimator.is_empty()).then(|| CentralityWindow {
            estimator: options.centrality_estimator.clone(),
            min: options.centrality_min,
            max: options.centrality_max,
        }),
        selection_mask: options.trigger,
        vertex_diamond: VertexDiamond {
            x: 1.0,
            y: 1.0,
            z: options.vertex_z,
        },
        rejected_generator: INJECTED_SIGNAL_GENERATOR.to_string(),
        min_pt: 0.0,
        max_pt: 20.0,
        eta: Binning {
            min: -0.8,
            max: 0.8,
            bins: 100,
        },
        delta_eta: Binning {
            min: 0.0,
            max: 1.6,
            bins: 64,
        },
        pt: Binning {
            min: 0.0,
            max: 20.0,
            bins: 100,
        },
        pid: options.use_pid.then_some(PidSettings {
            particle: options.particle,
            nsigma_combination: options.use_pid_nsigma_combination,
            bayes_threshold: options.bayes_threshold,
        }),
        aod_filter_bit: options.aod_filter_bit,
        wiring,
    }
}

/// Configure the balance-function efficiency/contamination task and add it
/// to the manager.
pub fn add_task_balance_eff_cont(
    manager: Option<&mut dyn AnalysisManager>,
    options: &BalanceEffContOptions,
) -> Result<RegisteredTask<BalanceTaskDescriptor>, ComposeError> {
    let Some(manager) = manager else {
        let err = ComposeError::NoManager;
        error!("{}", err);
        return Err(err);
    };
    let Some(handler) = manager.input_handler() else {
        let err = ComposeError::NoInputHandler;
        error!("{}", err);
        return Err(err);
    };

    let analysis_type = if manager.has_mc_truth_handler() {
        AnalysisType::Mc
    } else {
        match handler.data_kind {
            DataKind::Esd => AnalysisType::Esd,
            DataKind::Aod => AnalysisType::Aod,
        }
    };

    let task = build_balance_task(options, analysis_type);
    let wiring = task.wiring.clone();
    let registered = wire_task(manager, task, &wiring).map_err(|err| {
        error!("{}", err);
        ComposeError::from(err)
    })?;

    info!(
        centrality = %options.centrality_tag(),
        pid = options.pid_suffix(),
        "Balance-function efficiency task added"
    );
    Ok(registered)
}
