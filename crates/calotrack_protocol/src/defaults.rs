//! Canonical default values shared by the resolvers, the composer and the CLI.

pub const DEFAULT_TRIGGER: &str = "EMC7";
pub const DEFAULT_YEAR: i32 = 2011;
pub const DEFAULT_PERIOD: &str = "LHC17";

/// Result file used when neither the caller nor the manager names one.
pub const DEFAULT_COMMON_FILE: &str = "AnalysisResults.root";
pub const DEFAULT_PARAM_FILE: &str = "AnalysisParameters.root";

pub const ARTIFACT_PREFIX: &str = "CTC";
pub const PARAM_PREFIX: &str = "Param_";

pub const SMEARING_TOKEN: &str = "Smearing";
pub const SPD_PILE_UP_TOKEN: &str = "SPDPileUp";

/// Track cut-set ids handed to the cut builder for ESD input.
pub const ESD_PRIMARY_CUT_ID: u32 = 10001008;
pub const ESD_COMPLEMENTARY_CUT_ID: u32 = 10011008;

pub const DEFAULT_CENTRALITY_ESTIMATOR: &str = "V0M";
pub const DEFAULT_EVENT_PLANE_METHOD: &str = "V0";

/// Value meaning "no centrality bound".
pub const UNSET_CENTRALITY: i32 = -1;
