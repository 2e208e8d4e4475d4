use crate::defaults::{ARTIFACT_PREFIX, PARAM_PREFIX};
use crate::flags::InputFlags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical name of a task's produced artifacts.
///
/// Doubles as log identifier, task name and result-container key; downstream
/// tooling parses it, so the suffix order is part of the contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactName(String);

impl ArtifactName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of the parameter list stored next to the results.
    pub fn param_name(&self) -> String {
        format!("{}{}", PARAM_PREFIX, self.0)
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ArtifactName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build the artifact name.
///
/// `CTC_<calorimeter>_Trig_<trigger>` followed, in this order, by
/// `_Cen<min>_<max>` (PbPb with an upper centrality bound), `_Cl<array>`,
/// `_MixOn` and `_<cuts>`. The cuts string is inserted verbatim.
pub fn derive_artifact_name(flags: &InputFlags) -> ArtifactName {
    let mut name = format!(
        "{}_{}_Trig_{}",
        ARTIFACT_PREFIX, flags.calorimeter, flags.trigger
    );

    if flags.collision.is_heavy_ion() && flags.centrality.is_selected() {
        name.push_str(&format!(
            "_Cen{}_{}",
            flags.centrality.min, flags.centrality.max
        ));
    }
    if let Some(clusters) = flags.clusters_override() {
        name.push_str(&format!("_Cl{}", clusters));
    }
    if flags.mixing {
        name.push_str("_MixOn");
    }
    if !flags.cuts.is_empty() {
        name.push('_');
        name.push_str(&flags.cuts);
    }

    ArtifactName(name)
}
