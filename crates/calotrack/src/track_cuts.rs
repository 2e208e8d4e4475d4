//! Track cut-set factory seam.
//!
//! The cut definitions themselves belong to the jet working group's cut
//! builder; the reader only stores what the factory hands back.

use serde::Serialize;

/// Opaque, ready-made track cut set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackCutSet {
    pub id: u32,
    pub label: String,
}

/// Builds a cut set from its numeric identifier.
pub trait TrackCutFactory {
    fn build(&self, id: u32) -> TrackCutSet;
}

/// Catalogue of the jet working-group cut ids used for ESD input.
#[derive(Debug, Clone, Copy, Default)]
pub struct JetTrackCutCatalog;

const KNOWN_CUTS: &[(u32, &str)] = &[
    (10001008, "global_its_tpc_2011_spd_any"),
    (10011008, "global_its_tpc_2011_no_spd_its_refit"),
    (10041004, "hybrid_2010_tpc_constrained"),
];

impl TrackCutFactory for JetTrackCutCatalog {
    fn build(&self, id: u32) -> TrackCutSet {
        let label = KNOWN_CUTS
            .iter()
            .find(|(known, _)| *known == id)
            .map(|(_, label)| label.to_string())
            .unwrap_or_else(|| format!("cuts_{}", id));
        TrackCutSet { id, label }
    }
}
