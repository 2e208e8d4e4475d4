//! Trigger-class lookup: abbreviated trigger name + year to an offline
//! event mask and the calorimeter trigger string the reader must see fired.

use calotrack_protocol::TriggerMask;
use serde::Serialize;
use tracing::warn;

/// Result of a trigger lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerSelection {
    pub mask: TriggerMask,
    /// Fired-class fragment required in the event, empty for minimum bias
    pub calo_trigger: String,
}

impl TriggerSelection {
    pub fn new(mask: TriggerMask, calo_trigger: impl Into<String>) -> Self {
        Self {
            mask,
            calo_trigger: calo_trigger.into(),
        }
    }
}

/// Maps a trigger class and data-taking year to its selection.
pub trait TriggerMaskLookup {
    fn lookup(&self, trigger: &str, year: i32) -> TriggerSelection;
}

struct TriggerRow {
    names: &'static [&'static str],
    select: fn(i32) -> (TriggerMask, &'static str),
}

const TRIGGER_TABLE: &[TriggerRow] = &[
    TriggerRow {
        names: &["default", "INT7", "MB", "INT", "EMCAL", "DCAL", "DCAL_EMCAL"],
        select: |year| {
            if year <= 2010 {
                (TriggerMask::MB, "")
            } else {
                (TriggerMask::INT7, "")
            }
        },
    },
    TriggerRow {
        names: &["EMC7", "EMCAL_L0", "L0"],
        select: |year| {
            if year <= 2010 {
                (TriggerMask::EMC1, "EMC1")
            } else {
                (TriggerMask::EMC7, "EMC7")
            }
        },
    },
    TriggerRow {
        names: &["DMC7", "DCAL_L0"],
        select: |_| (TriggerMask::EMC7, "DMC7"),
    },
    TriggerRow {
        names: &["EMCAL_L1", "EG1", "L1"],
        select: |year| {
            if year <= 2011 {
                (TriggerMask::EMCEGA, "EGA")
            } else {
                (TriggerMask::EMCEGA, "EG1")
            }
        },
    },
    TriggerRow {
        names: &["EMCAL_L2", "EG2", "L2"],
        select: |_| (TriggerMask::EMCEGA, "EG2"),
    },
    TriggerRow {
        names: &["DCAL_L1", "DG1"],
        select: |_| (TriggerMask::EMCEGA, "DG1"),
    },
    TriggerRow {
        names: &["DCAL_L2", "DG2"],
        select: |_| (TriggerMask::EMCEGA, "DG2"),
    },
    TriggerRow {
        names: &["EMCAL_J1", "EJ1"],
        select: |year| {
            if year <= 2011 {
                (TriggerMask::EMCEJE, "EJE")
            } else {
                (TriggerMask::EMCEJE, "EJ1")
            }
        },
    },
    TriggerRow {
        names: &["EMCAL_J2", "EJ2"],
        select: |_| (TriggerMask::EMCEJE, "EJ2"),
    },
    TriggerRow {
        names: &["DCAL_J1", "DJ1"],
        select: |_| (TriggerMask::EMCEJE, "DJ1"),
    },
    TriggerRow {
        names: &["DCAL_J2", "DJ2"],
        select: |_| (TriggerMask::EMCEJE, "DJ2"),
    },
    TriggerRow {
        names: &["PHOS", "PHI7", "PHOS_L0"],
        select: |_| (TriggerMask::PHI7, "PHI7"),
    },
    TriggerRow {
        names: &["Central"],
        select: |_| (TriggerMask::CENTRAL, ""),
    },
    TriggerRow {
        names: &["SemiCentral"],
        select: |_| (TriggerMask::SEMI_CENTRAL, ""),
    },
    TriggerRow {
        names: &["AnyINT"],
        select: |_| {
            (
                TriggerMask::MB
                    | TriggerMask::INT7
                    | TriggerMask::INT5
                    | TriggerMask::INT8
                    | TriggerMask::SPI7,
                "",
            )
        },
    },
];

/// Reference trigger table for the calorimeter triggers of 2010-2018 data.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerTable;

impl TriggerMaskLookup for TriggerTable {
    fn lookup(&self, trigger: &str, year: i32) -> TriggerSelection {
        match TRIGGER_TABLE
            .iter()
            .find(|row| row.names.contains(&trigger))
        {
            Some(row) => {
                let (mask, calo) = (row.select)(year);
                TriggerSelection::new(mask, calo)
            }
            None => {
                warn!(
                    "Unknown trigger class '{}' for year {}; accepting any trigger",
                    trigger, year
                );
                TriggerSelection::new(TriggerMask::ANY, "")
            }
        }
    }
}
