//! Task composition.
//!
//! [`compose`] joins the resolved reader and calorimeter-utils settings into
//! one [`TaskDescriptor`] and decides where trigger filtering happens.
//! [`add_task_calo_track_corr_base`] is the full setup routine: production
//! override, collaborator checks, resolution, composition and wiring.

use calotrack_protocol::defaults::DEFAULT_PARAM_FILE;
use calotrack_protocol::{
    derive_artifact_name, ArtifactName, ContainerKind, InputFlags, TriggerMask,
};
use serde::Serialize;
use tracing::{error, info};

use crate::calo_utils::{resolve_calibration, CalibrationConfig};
use crate::error::ComposeError;
use crate::manager::{wire_task, AnalysisManager, AnalysisTask, OutputSpec, RegisteredTask, Wiring};
use crate::production::{apply_production_variables, ProcessEnv, ProductionEnv};
use crate::reader::{resolve_reader, ReaderConfig};
use crate::track_cuts::{JetTrackCutCatalog, TrackCutFactory};
use crate::trigger::{TriggerMaskLookup, TriggerTable};

pub const INPUT_SLOT: usize = 0;
pub const RESULTS_SLOT: usize = 1;
pub const PARAMS_SLOT: usize = 2;

/// Event mask used to pick the background events for mixing.
pub const MIXING_EVENT_MASK: TriggerMask = TriggerMask::INT7;

/// Where trigger filtering is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum TriggerRouting {
    /// Simulation: the manager's default selection stays in place
    AcceptAll,
    /// The task selects collision candidates
    Task {
        mask: TriggerMask,
        calo_trigger: String,
    },
    /// The reader filters, keeping other events for mixing
    Reader {
        mask: TriggerMask,
        mix_mask: TriggerMask,
        calo_trigger: String,
    },
}

impl TriggerRouting {
    pub fn task_mask(&self) -> Option<TriggerMask> {
        match self {
            TriggerRouting::Task { mask, .. } => Some(*mask),
            _ => None,
        }
    }

    pub fn reader_mask(&self) -> Option<TriggerMask> {
        match self {
            TriggerRouting::Reader { mask, .. } => Some(*mask),
            _ => None,
        }
    }

    /// Fired-trigger class the reader requires, empty when none.
    pub fn fired_trigger_class(&self) -> &str {
        match self {
            TriggerRouting::AcceptAll => "",
            TriggerRouting::Task { calo_trigger, .. }
            | TriggerRouting::Reader { calo_trigger, .. } => calo_trigger,
        }
    }

    /// Whether trigger selection is left to the task's event selection
    /// rather than the reader. True for `Task` and `AcceptAll`.
    pub fn trigger_at_task_selection(&self) -> bool {
        !matches!(self, TriggerRouting::Reader { .. })
    }
}

/// Settings of the maker that drives the analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MakerSettings {
    pub debug: i32,
    pub histograms: bool,
    pub aods: bool,
    pub data_control_histograms: bool,
    pub mc_cross_section_fill: bool,
    pub pt_hard_histogram: bool,
    pub container_list_name: String,
}

impl MakerSettings {
    fn new(flags: &InputFlags, name: &ArtifactName) -> Self {
        Self {
            debug: flags.debug,
            histograms: true,
            aods: true,
            data_control_histograms: !flags.simulation && flags.trigger.contains("EMC"),
            mc_cross_section_fill: flags.simulation,
            pt_hard_histogram: flags.simulation,
            container_list_name: name.to_string(),
        }
    }
}

/// Files the two output lists go to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFiles {
    pub results: String,
    pub params: String,
}

impl OutputFiles {
    /// Caller file if given, otherwise the manager's common file.
    pub fn resolve(flags: &InputFlags, common_file: &str) -> Self {
        Self {
            results: flags.output_file_override().unwrap_or(common_file).to_string(),
            params: DEFAULT_PARAM_FILE.to_string(),
        }
    }
}

/// The composed task handed to the execution manager.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDescriptor {
    pub name: ArtifactName,
    pub debug_level: i32,
    pub fingerprint: String,
    pub period: Option<String>,
    pub flags: InputFlags,
    pub reader: ReaderConfig,
    pub calibration: CalibrationConfig,
    pub maker: MakerSettings,
    pub trigger: TriggerRouting,
    pub wiring: Wiring,
}

impl TaskDescriptor {
    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = Some(period.into());
        self
    }
}

impl AnalysisTask for TaskDescriptor {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn settings(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Compose the task. The trigger lookup is only consulted for real data.
pub fn compose(
    flags: &InputFlags,
    reader: ReaderConfig,
    calibration: CalibrationConfig,
    name: ArtifactName,
    triggers: &dyn TriggerMaskLookup,
    files: &OutputFiles,
) -> TaskDescriptor {
    let trigger = if flags.simulation {
        TriggerRouting::AcceptAll
    } else {
        let selection = triggers.lookup(&flags.trigger, flags.year);
        if flags.mixing {
            info!("Trigger selection done in the reader");
            TriggerRouting::Reader {
                mask: selection.mask,
                mix_mask: MIXING_EVENT_MASK,
                calo_trigger: selection.calo_trigger,
            }
        } else {
            TriggerRouting::Task {
                mask: selection.mask,
                calo_trigger: selection.calo_trigger,
            }
        }
    };

    let wiring = Wiring {
        input_slot: INPUT_SLOT,
        outputs: vec![
            OutputSpec {
                slot: RESULTS_SLOT,
                name: name.to_string(),
                kind: ContainerKind::Output,
                file: files.results.clone(),
            },
            OutputSpec {
                slot: PARAMS_SLOT,
                name: name.param_name(),
                kind: ContainerKind::Param,
                file: files.params.clone(),
            },
        ],
    };

    TaskDescriptor {
        maker: MakerSettings::new(flags, &name),
        name,
        debug_level: flags.debug,
        fingerprint: flags.fingerprint(),
        period: None,
        flags: flags.clone(),
        reader,
        calibration,
        trigger,
        wiring,
    }
}

/// External collaborators of the setup routine.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub triggers: &'a dyn TriggerMaskLookup,
    pub track_cuts: &'a dyn TrackCutFactory,
    pub production: &'a dyn ProductionEnv,
}

impl Collaborators<'static> {
    /// Reference trigger table, jet cut catalogue and the process environment.
    pub fn reference() -> Self {
        Self {
            triggers: &TriggerTable,
            track_cuts: &JetTrackCutCatalog,
            production: &ProcessEnv,
        }
    }
}

/// Name the base task registers under: production variables first, then the
/// naming contract.
pub fn registered_name(flags: &InputFlags, production: &dyn ProductionEnv) -> ArtifactName {
    derive_artifact_name(&apply_production_variables(flags, production).flags)
}

/// Configure the calorimeter/track correlation base task and add it to the
/// manager.
pub fn add_task_calo_track_corr_base(
    manager: Option<&mut dyn AnalysisManager>,
    flags: &InputFlags,
    collaborators: &Collaborators<'_>,
) -> Result<RegisteredTask<TaskDescriptor>, ComposeError> {
    let production = apply_production_variables(flags, collaborators.production);
    let flags = production.flags;

    info!(
        calorimeter = %flags.calorimeter,
        simulation = flags.simulation,
        year = flags.year,
        collision = %flags.collision,
        trigger = %flags.trigger,
        reject_emc_trigger = flags.reject_emc_trigger,
        clusters = %flags.clusters_array,
        cuts = %flags.cuts,
        calibrate = flags.calibrate,
        non_linearity = flags.non_linearity,
        min_cen = flags.centrality.min,
        max_cen = flags.centrality.max,
        mixing = flags.mixing,
        output_file = %flags.output_file,
        debug = flags.debug,
        "Base task settings"
    );

    let Some(manager) = manager else {
        let err = ComposeError::NoManager;
        error!("{}", err);
        return Err(err);
    };

    let Some(handler) = manager.input_handler_mut() else {
        let err = ComposeError::NoInputHandler;
        error!("{}", err);
        return Err(err);
    };
    handler.need_field = true;
    let data_kind = handler.data_kind;

    let name = derive_artifact_name(&flags);
    info!(name = %name, "Folder name");

    let reader = resolve_reader(&flags, data_kind, collaborators.track_cuts);
    let calibration = resolve_calibration(&flags);
    let files = OutputFiles::resolve(&flags, manager.common_file_name());

    let descriptor = compose(
        &flags,
        reader,
        calibration,
        name,
        collaborators.triggers,
        &files,
    )
    .with_period(production.period);

    if flags.print_settings {
        match serde_json::to_string_pretty(&descriptor) {
            Ok(json) => info!("Task settings:\n{}", json),
            Err(err) => error!("Failed to render task settings: {}", err),
        }
    }

    let wiring = descriptor.wiring.clone();
    let registered = wire_task(manager, descriptor, &wiring).map_err(|err| {
        error!("{}", err);
        ComposeError::from(err)
    })?;

    info!(name = %registered.task.name, "End base task configuration");
    Ok(registered)
}
