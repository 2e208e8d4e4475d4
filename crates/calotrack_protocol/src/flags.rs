//! Caller-supplied input flags for the calorimeter/track correlation task.

use crate::defaults::{
    DEFAULT_TRIGGER, DEFAULT_YEAR, SMEARING_TOKEN, SPD_PILE_UP_TOKEN, UNSET_CENTRALITY,
};
use crate::types::{Calorimeter, CollisionSystem};
use blake3::Hasher;
use serde::{Deserialize, Serialize};

const SEP: u8 = 0x1f;

/// Centrality bounds in percent; `-1` on either side means "no bound".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CentralityRange {
    pub min: i32,
    pub max: i32,
}

impl CentralityRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn unset() -> Self {
        Self::new(UNSET_CENTRALITY, UNSET_CENTRALITY)
    }

    /// A range counts as selected once its upper bound is non-negative.
    pub fn is_selected(&self) -> bool {
        self.max >= 0
    }
}

impl Default for CentralityRange {
    fn default() -> Self {
        Self::unset()
    }
}

/// Every knob of one task invocation. Immutable once handed to the resolvers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFlags {
    pub calorimeter: Calorimeter,
    pub simulation: bool,
    pub year: i32,
    pub collision: CollisionSystem,
    /// 0 keeps bad EMCAL-triggered events; 1 and 2 select the L1 bit layout
    pub reject_emc_trigger: i32,
    pub clusters_array: String,
    /// Free-form cut tokens, matched as substrings
    pub cuts: String,
    pub calibrate: bool,
    pub non_linearity: bool,
    pub centrality: CentralityRange,
    pub mixing: bool,
    pub output_file: String,
    pub print_settings: bool,
    pub debug: i32,
    pub trigger: String,
}

impl Default for InputFlags {
    fn default() -> Self {
        Self {
            calorimeter: Calorimeter::Emcal,
            simulation: false,
            year: DEFAULT_YEAR,
            collision: CollisionSystem::Pp,
            reject_emc_trigger: 0,
            clusters_array: String::new(),
            cuts: String::new(),
            calibrate: false,
            non_linearity: false,
            centrality: CentralityRange::unset(),
            mixing: true,
            output_file: String::new(),
            print_settings: false,
            debug: 0,
            trigger: DEFAULT_TRIGGER.to_string(),
        }
    }
}

impl InputFlags {
    pub fn wants_smearing(&self) -> bool {
        self.cuts.contains(SMEARING_TOKEN)
    }

    pub fn wants_spd_pile_up(&self) -> bool {
        self.cuts.contains(SPD_PILE_UP_TOKEN)
    }

    /// Cluster array override, `None` when the default list is used.
    pub fn clusters_override(&self) -> Option<&str> {
        if self.clusters_array.is_empty() {
            None
        } else {
            Some(self.clusters_array.as_str())
        }
    }

    /// Output file requested by the caller, `None` means the manager's common file.
    pub fn output_file_override(&self) -> Option<&str> {
        if self.output_file.is_empty() {
            None
        } else {
            Some(self.output_file.as_str())
        }
    }

    /// Stable digest over every field.
    ///
    /// Two flag sets with equal fingerprints configure identical tasks; the
    /// manager uses it to tell a harmless re-registration from two distinct
    /// configurations aliasing the same container name.
    pub fn fingerprint(&self) -> String {
        let fields = [
            self.calorimeter.as_str().to_string(),
            self.simulation.to_string(),
            self.year.to_string(),
            self.collision.as_str().to_string(),
            self.reject_emc_trigger.to_string(),
            self.clusters_array.clone(),
            self.cuts.clone(),
            self.calibrate.to_string(),
            self.non_linearity.to_string(),
            self.centrality.min.to_string(),
            self.centrality.max.to_string(),
            self.mixing.to_string(),
            self.output_file.clone(),
            self.print_settings.to_string(),
            self.debug.to_string(),
            self.trigger.clone(),
        ];
        let mut hasher = Hasher::new();
        for field in &fields {
            hasher.update(field.as_bytes());
            hasher.update(&[SEP]);
        }
        hasher.finalize().to_hex().to_string()
    }
}
