//! Event reader configuration.
//!
//! [`resolve_reader`] turns the input flags plus the input data kind into the
//! complete, immutable settings of the cluster/track reader. Steps run in a
//! fixed order and each derived field depends only on the flags named next to
//! it; the only collaborator is the cut builder used for ESD input.

use calotrack_protocol::defaults::{
    DEFAULT_CENTRALITY_ESTIMATOR, DEFAULT_EVENT_PLANE_METHOD, ESD_COMPLEMENTARY_CUT_ID,
    ESD_PRIMARY_CUT_ID,
};
use calotrack_protocol::{Calorimeter, CentralityRange, DataKind, InputFlags};
use serde::Serialize;
use tracing::{debug, info};

use crate::track_cuts::{TrackCutFactory, TrackCutSet};

// ============================================================================
// Record types
// ============================================================================

/// Simple angular acceptance: |eta| < `eta_max`, `phi_min` < phi < `phi_max` (degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AcceptanceWindow {
    pub eta_max: f64,
    pub phi_min: f64,
    pub phi_max: f64,
}

impl AcceptanceWindow {
    pub const fn new(eta_max: f64, phi_min: f64, phi_max: f64) -> Self {
        Self {
            eta_max,
            phi_min,
            phi_max,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.eta_max > 0.0 && self.phi_min < self.phi_max)
    }
}

pub const TRACK_WINDOW: AcceptanceWindow = AcceptanceWindow::new(0.8, 0.0, 360.0);
pub const EMCAL_WINDOW: AcceptanceWindow = AcceptanceWindow::new(0.70, 80.0, 187.0);
pub const DCAL_WINDOW: AcceptanceWindow = AcceptanceWindow::new(0.70, 260.0, 327.0);
pub const PHOS_WINDOW: AcceptanceWindow = AcceptanceWindow::new(0.12, 250.0, 320.0);

/// Acceptance window of a calorimeter, `None` for unrecognised names.
pub fn calorimeter_window(calorimeter: &Calorimeter) -> Option<AcceptanceWindow> {
    match calorimeter {
        Calorimeter::Emcal => Some(EMCAL_WINDOW),
        Calorimeter::Dcal => Some(DCAL_WINDOW),
        Calorimeter::Phos => Some(PHOS_WINDOW),
        Calorimeter::Other(_) => None,
    }
}

/// Fiducial cuts per sub-detector. PHOS acceptance is always applied since
/// PHOS clusters may enter QA even when another calorimeter triggers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FiducialCuts {
    pub tracks: AcceptanceWindow,
    /// EMCAL or DCAL window, set only when one of them is the trigger calorimeter
    pub emcal: Option<AcceptanceWindow>,
    pub phos: AcceptanceWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Threshold {
    pub min: f64,
    pub max: f64,
}

impl Threshold {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Energy (calorimeters, GeV) and transverse momentum (tracks, GeV/c) acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KinematicThresholds {
    pub emcal_energy: Threshold,
    pub phos_energy: Threshold,
    pub track_pt: Threshold,
}

pub const KINEMATIC_THRESHOLDS: KinematicThresholds = KinematicThresholds {
    emcal_energy: Threshold::new(0.3, 1000.0),
    phos_energy: Threshold::new(0.3, 1000.0),
    track_pt: Threshold::new(0.2, 1000.0),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SmearingFunction {
    Landau,
    LandauShift,
}

/// Shower-shape smearing applied to simulated clusters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShowerShapeSmearing {
    pub function: SmearingFunction,
    pub width: f64,
}

/// Rejection of pt-hard simulated events whose leading jet overshoots the
/// generated pt-hard by more than `jet_pt_factor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PtHardRejection {
    pub jet_pt_factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    ItsRefit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EsdTrackSelection {
    pub primary: TrackCutSet,
    pub complementary: TrackCutSet,
    pub constrain_to_vertex: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AodTrackSelection {
    pub hybrid: bool,
    pub shared_cluster: bool,
    pub status: TrackStatus,
}

/// Track selection policy; the variant follows the input data kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TrackSelection {
    Esd(EsdTrackSelection),
    Aod(AodTrackSelection),
}

impl TrackSelection {
    pub fn esd(&self) -> Option<&EsdTrackSelection> {
        match self {
            TrackSelection::Esd(esd) => Some(esd),
            TrackSelection::Aod(_) => None,
        }
    }

    pub fn aod(&self) -> Option<&AodTrackSelection> {
        match self {
            TrackSelection::Aod(aod) => Some(aod),
            TrackSelection::Esd(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeWindow {
    pub min: f64,
    pub max: f64,
}

impl TimeWindow {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeCut {
    pub enabled: bool,
    pub window: TimeWindow,
}

pub const OPEN_TIME_WINDOW: TimeWindow = TimeWindow::new(-1e10, 1e10);

/// Cluster time windows (ns) for real data, keyed by first year of validity.
const EMCAL_TIME_WINDOWS: &[(i32, TimeWindow)] = &[
    (i32::MIN, TimeWindow::new(-25.0, 20.0)),
    (2016, TimeWindow::new(-20.0, 15.0)),
];

/// EMCAL cluster time cut: open for simulation, year-dependent for data.
pub fn emcal_time_cut(simulation: bool, year: i32) -> TimeCut {
    if simulation {
        return TimeCut {
            enabled: false,
            window: OPEN_TIME_WINDOW,
        };
    }
    let window = EMCAL_TIME_WINDOWS
        .iter()
        .rev()
        .find(|(since, _)| year >= *since)
        .map(|(_, window)| *window)
        .unwrap_or(OPEN_TIME_WINDOW);
    TimeCut {
        enabled: true,
        window,
    }
}

/// Matching of clusters to the EMCAL trigger patch and removal of events
/// whose trigger could not be confirmed. Both switch together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TriggerPatchMatching {
    pub enabled: bool,
    pub remove_bad_trigger_events: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpdPileUpParam {
    pub index: u32,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PileUpRejection {
    /// Tuned SPD parameter, only for data taken after 2013
    pub spd_param: Option<SpdPileUpParam>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentralitySelection {
    pub estimator: String,
    /// Bin granularity: 10, 20 or 100 classes
    pub bins: u32,
    pub range: CentralityRange,
    pub event_plane_method: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DetectorSwitches {
    pub tracks: bool,
    pub emcal: bool,
    pub emcal_cells: bool,
    pub phos: bool,
    pub phos_cells: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EventSelection {
    pub z_vertex_cut: f64,
    pub primary_vertex: bool,
    pub reject_no_track_events: bool,
    pub v0_and: bool,
    pub recalculate_vertex_bc: bool,
    pub vertex_bc_event_selection: bool,
}

/// Fully resolved reader settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReaderConfig {
    pub debug: i32,
    pub data_kind: DataKind,
    pub fiducial: FiducialCuts,
    pub thresholds: KinematicThresholds,
    pub pt_hard_rejection: Option<PtHardRejection>,
    pub smearing: Option<ShowerShapeSmearing>,
    pub detectors: DetectorSwitches,
    pub track_selection: TrackSelection,
    pub track_time_cut: TimeCut,
    pub track_dca_cut: bool,
    /// Empty means the default cluster branch
    pub emcal_cluster_list: String,
    pub cluster_recalculation: bool,
    pub emcal_time_cut: TimeCut,
    pub parametrized_time_cut: bool,
    pub non_linearity_correction: bool,
    pub trigger_patch: TriggerPatchMatching,
    pub event: EventSelection,
    pub pile_up: Option<PileUpRejection>,
    pub centrality: Option<CentralitySelection>,
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the reader settings. Total: never fails, unknown values take the
/// documented fallback branch.
pub fn resolve_reader(
    flags: &InputFlags,
    data_kind: DataKind,
    cuts: &dyn TrackCutFactory,
) -> ReaderConfig {
    let fiducial = FiducialCuts {
        tracks: TRACK_WINDOW,
        emcal: if flags.calorimeter.is_emcal_like() {
            calorimeter_window(&flags.calorimeter)
        } else {
            None
        },
        phos: PHOS_WINDOW,
    };

    let smearing = (flags.simulation && flags.wants_smearing()).then_some(ShowerShapeSmearing {
        function: SmearingFunction::Landau,
        width: 0.005,
    });

    let track_selection = match data_kind {
        DataKind::Esd => TrackSelection::Esd(EsdTrackSelection {
            primary: cuts.build(ESD_PRIMARY_CUT_ID),
            complementary: cuts.build(ESD_COMPLEMENTARY_CUT_ID),
            constrain_to_vertex: true,
        }),
        DataKind::Aod => TrackSelection::Aod(AodTrackSelection {
            hybrid: true,
            shared_cluster: true,
            status: TrackStatus::ItsRefit,
        }),
    };

    let reject_bad_triggers = flags.reject_emc_trigger > 0
        && !flags.simulation
        && (flags.trigger.contains("EMC") || flags.trigger.contains('L'));
    if reject_bad_triggers {
        info!(trigger = %flags.trigger, "Remove bad triggers: trigger patch matching on");
    }

    let pile_up = flags.wants_spd_pile_up().then(|| {
        info!("Switch on pile-up event rejection by SPD");
        PileUpRejection {
            spd_param: (flags.year > 2013).then_some(SpdPileUpParam {
                index: 0,
                value: 5.0,
            }),
        }
    });

    let centrality = flags
        .collision
        .is_heavy_ion()
        .then(|| CentralitySelection {
            estimator: DEFAULT_CENTRALITY_ESTIMATOR.to_string(),
            bins: 100,
            range: flags.centrality,
            event_plane_method: DEFAULT_EVENT_PLANE_METHOD.to_string(),
        });

    let emcal_like = flags.calorimeter.is_emcal_like();
    let phos = flags.calorimeter == Calorimeter::Phos;

    let config = ReaderConfig {
        debug: flags.debug,
        data_kind,
        fiducial,
        thresholds: KINEMATIC_THRESHOLDS,
        pt_hard_rejection: flags
            .simulation
            .then_some(PtHardRejection { jet_pt_factor: 2.0 }),
        smearing,
        detectors: DetectorSwitches {
            tracks: true,
            emcal: emcal_like,
            emcal_cells: emcal_like,
            phos,
            phos_cells: phos,
        },
        track_selection,
        track_time_cut: TimeCut {
            enabled: false,
            window: TimeWindow::new(0.0, 50.0),
        },
        track_dca_cut: false,
        emcal_cluster_list: flags.clusters_array.clone(),
        cluster_recalculation: flags.calibrate,
        emcal_time_cut: emcal_time_cut(flags.simulation, flags.year),
        parametrized_time_cut: false,
        non_linearity_correction: flags.non_linearity,
        trigger_patch: TriggerPatchMatching {
            enabled: reject_bad_triggers,
            remove_bad_trigger_events: reject_bad_triggers,
        },
        event: EventSelection {
            z_vertex_cut: 10.0,
            primary_vertex: true,
            reject_no_track_events: true,
            v0_and: false,
            recalculate_vertex_bc: false,
            vertex_bc_event_selection: false,
        },
        pile_up,
        centrality,
    };

    debug!(data_kind = %data_kind, calorimeter = %flags.calorimeter, "Reader configured");
    config
}
