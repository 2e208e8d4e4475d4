//! Calorimeter utility configuration: super-module geometry, clusterizer
//! local-maxima cuts and the calibration switches of the reconstruction utils.

use calotrack_protocol::{Calorimeter, CollisionSystem, DetectorFamily, InputFlags};
use serde::Serialize;
use tracing::{debug, warn};

/// Year bucket of the super-module layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum YearBucket {
    /// 2010: first four EMCAL super modules only
    FirstYear,
    /// 2011-2013
    Run1,
    /// 2014 onwards, DCAL installed
    Run2,
}

impl YearBucket {
    pub fn of(year: i32) -> Self {
        if year == 2010 {
            YearBucket::FirstYear
        } else if year < 2014 {
            YearBucket::Run1
        } else {
            YearBucket::Run2
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GeometryKey {
    Emcal,
    Dcal,
    Phos,
}

/// Installed super modules and the index range the analysis reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SuperModuleGeometry {
    pub family: DetectorFamily,
    pub total: u32,
    pub first: u32,
    pub last: u32,
}

impl SuperModuleGeometry {
    const fn new(family: DetectorFamily, total: u32, first: u32, last: u32) -> Self {
        Self {
            family,
            total,
            first,
            last,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.first <= self.last && self.last < self.total
    }

    pub fn overlaps(&self, other: &SuperModuleGeometry) -> bool {
        self.family == other.family && self.first <= other.last && other.first <= self.last
    }
}

type GeometryRow = (YearBucket, GeometryKey, SuperModuleGeometry);

const fn row(
    bucket: YearBucket,
    key: GeometryKey,
    family: DetectorFamily,
    total: u32,
    first: u32,
    last: u32,
) -> GeometryRow {
    (bucket, key, SuperModuleGeometry::new(family, total, first, last))
}

/// DCAL has no modules before 2014; its rows keep the Run 2 numbering so the
/// index range stays inside the installed count.
const GEOMETRY_TABLE: &[GeometryRow] = &[
    row(YearBucket::FirstYear, GeometryKey::Emcal, DetectorFamily::Emcal, 4, 0, 3),
    row(YearBucket::Run1, GeometryKey::Emcal, DetectorFamily::Emcal, 10, 0, 9),
    row(YearBucket::Run2, GeometryKey::Emcal, DetectorFamily::Emcal, 20, 0, 11),
    row(YearBucket::FirstYear, GeometryKey::Dcal, DetectorFamily::Emcal, 20, 12, 19),
    row(YearBucket::Run1, GeometryKey::Dcal, DetectorFamily::Emcal, 20, 12, 19),
    row(YearBucket::Run2, GeometryKey::Dcal, DetectorFamily::Emcal, 20, 12, 19),
    row(YearBucket::FirstYear, GeometryKey::Phos, DetectorFamily::Phos, 3, 0, 2),
    row(YearBucket::Run1, GeometryKey::Phos, DetectorFamily::Phos, 3, 0, 2),
    row(YearBucket::Run2, GeometryKey::Phos, DetectorFamily::Phos, 4, 0, 3),
];

fn table_row(bucket: YearBucket, key: GeometryKey) -> Option<SuperModuleGeometry> {
    GEOMETRY_TABLE
        .iter()
        .find(|(b, k, _)| *b == bucket && *k == key)
        .map(|(_, _, geometry)| *geometry)
}

/// Every enumerated row, for auditing the table.
pub fn geometry_rows() -> impl Iterator<Item = (YearBucket, Calorimeter, SuperModuleGeometry)> {
    GEOMETRY_TABLE.iter().map(|(bucket, key, geometry)| {
        let calorimeter = match key {
            GeometryKey::Emcal => Calorimeter::Emcal,
            GeometryKey::Dcal => Calorimeter::Dcal,
            GeometryKey::Phos => Calorimeter::Phos,
        };
        (*bucket, calorimeter, *geometry)
    })
}

/// Super-module layout for a calorimeter in a given year.
pub fn super_module_geometry(calorimeter: &Calorimeter, year: i32) -> SuperModuleGeometry {
    let bucket = YearBucket::of(year);
    let key = match calorimeter {
        Calorimeter::Emcal => GeometryKey::Emcal,
        Calorimeter::Dcal => {
            if bucket != YearBucket::Run2 {
                warn!(year, "DCAL requested before 2014; using the Run 2 layout");
            }
            GeometryKey::Dcal
        }
        Calorimeter::Phos => GeometryKey::Phos,
        Calorimeter::Other(name) => {
            let emcal = table_row(bucket, GeometryKey::Emcal)
                .unwrap_or(SuperModuleGeometry::new(DetectorFamily::Emcal, 20, 0, 19));
            warn!(
                calorimeter = %name,
                "Unrecognised calorimeter; reading all {} EMCAL-family super modules",
                emcal.total
            );
            return SuperModuleGeometry::new(DetectorFamily::Emcal, emcal.total, 0, emcal.total - 1);
        }
    };
    // Every (bucket, key) pair has a row.
    table_row(bucket, key).unwrap_or(SuperModuleGeometry::new(DetectorFamily::Emcal, 20, 0, 19))
}

/// Clusterizer local-maxima cut: (seed energy, cell energy difference).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocalMaximaCut {
    pub seed: f64,
    pub difference: f64,
}

pub fn local_maxima_cut(collision: CollisionSystem) -> LocalMaximaCut {
    match collision {
        CollisionSystem::Pp => LocalMaximaCut {
            seed: 0.1,
            difference: 0.03,
        },
        CollisionSystem::PbPb | CollisionSystem::PA => LocalMaximaCut {
            seed: 0.2,
            difference: 0.03,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellsFromBorder {
    pub emcal: u32,
    pub phos: u32,
}

/// EMCAL reconstruction-utils switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecoUtilsSwitches {
    pub reject_exotic: bool,
    pub non_linearity: bool,
    pub energy_calibration: bool,
    pub bad_channel_map: bool,
    pub time_calibration: bool,
}

/// Fully resolved calorimeter utility settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationConfig {
    pub debug: i32,
    pub geometry: SuperModuleGeometry,
    pub local_maxima: LocalMaximaCut,
    /// Cell recalibration; always switched together with the run-dependent correction
    pub recalibration: bool,
    pub non_linearity: bool,
    pub cells_from_border: CellsFromBorder,
    pub recalculate_track_matching: bool,
    pub remove_bad_channels: bool,
    pub load_emcal_matrices: bool,
    pub load_phos_matrices: bool,
    pub reco_utils: RecoUtilsSwitches,
}

impl CalibrationConfig {
    pub fn run_dependent_correction(&self) -> bool {
        self.recalibration
    }
}

/// Resolve the calorimeter utility settings. Total.
pub fn resolve_calibration(flags: &InputFlags) -> CalibrationConfig {
    let geometry = super_module_geometry(&flags.calorimeter, flags.year);
    let config = CalibrationConfig {
        debug: flags.debug,
        geometry,
        local_maxima: local_maxima_cut(flags.collision),
        recalibration: flags.calibrate,
        non_linearity: flags.non_linearity,
        cells_from_border: CellsFromBorder { emcal: 1, phos: 2 },
        recalculate_track_matching: false,
        remove_bad_channels: true,
        load_emcal_matrices: !flags.simulation,
        load_phos_matrices: false,
        reco_utils: RecoUtilsSwitches {
            reject_exotic: true,
            non_linearity: flags.non_linearity,
            energy_calibration: flags.calibrate,
            bad_channel_map: true,
            time_calibration: flags.calibrate,
        },
    };
    debug!(
        total = geometry.total,
        first = geometry.first,
        last = geometry.last,
        "Calorimeter utils configured"
    );
    config
}
