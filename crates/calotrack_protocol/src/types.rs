//! Canonical enums and value types (used across all calotrack crates)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

// ============================================================================
// Collision system
// ============================================================================

/// Colliding system of the sample.
/// This is the CANONICAL definition - use this everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum CollisionSystem {
    /// Proton-proton (default)
    #[default]
    Pp,
    /// Lead-lead
    PbPb,
    /// Proton-lead, either beam direction
    PA,
}

impl CollisionSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionSystem::Pp => "pp",
            CollisionSystem::PbPb => "PbPb",
            CollisionSystem::PA => "pA",
        }
    }

    /// Parse without failing: unknown systems fall back to `pp` with a warning.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_else(|err: String| {
            warn!("{}; falling back to '{}'", err, CollisionSystem::Pp);
            CollisionSystem::Pp
        })
    }

    pub fn is_heavy_ion(&self) -> bool {
        matches!(self, CollisionSystem::PbPb)
    }
}

impl fmt::Display for CollisionSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CollisionSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pp" | "p-p" => Ok(CollisionSystem::Pp),
            "pbpb" | "pb-pb" => Ok(CollisionSystem::PbPb),
            "pa" | "ppb" | "p-pb" | "pbp" | "pb-p" => Ok(CollisionSystem::PA),
            _ => Err(format!(
                "Invalid collision system: '{}'. Expected: pp, PbPb or pA",
                s
            )),
        }
    }
}

impl From<String> for CollisionSystem {
    fn from(value: String) -> Self {
        CollisionSystem::parse_lenient(&value)
    }
}

impl From<CollisionSystem> for String {
    fn from(value: CollisionSystem) -> Self {
        value.as_str().to_string()
    }
}

// ============================================================================
// Calorimeter
// ============================================================================

/// Calorimeter measuring the trigger particle.
///
/// Unknown names are kept verbatim in `Other` so the artifact name still
/// carries what the caller asked for; resolvers treat `Other` through their
/// documented fallback branches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Calorimeter {
    #[default]
    Emcal,
    Dcal,
    Phos,
    Other(String),
}

/// Detector family sharing a super-module numbering scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorFamily {
    /// EMCAL and DCAL share one 20 super-module numbering
    Emcal,
    Phos,
}

impl Calorimeter {
    pub fn as_str(&self) -> &str {
        match self {
            Calorimeter::Emcal => "EMCAL",
            Calorimeter::Dcal => "DCAL",
            Calorimeter::Phos => "PHOS",
            Calorimeter::Other(name) => name.as_str(),
        }
    }

    /// Parse without failing: unknown names become `Other` with a warning.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_else(|err: String| {
            warn!("{}; keeping it as an unrecognised calorimeter", err);
            Calorimeter::Other(s.to_string())
        })
    }

    pub fn is_emcal_like(&self) -> bool {
        matches!(self, Calorimeter::Emcal | Calorimeter::Dcal)
    }

    /// Anything that is not PHOS is geometrically treated as the EMCAL family.
    pub fn family(&self) -> DetectorFamily {
        match self {
            Calorimeter::Phos => DetectorFamily::Phos,
            _ => DetectorFamily::Emcal,
        }
    }
}

impl fmt::Display for Calorimeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Calorimeter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Case-sensitive: the name embeds the caller's spelling verbatim.
        match s {
            "EMCAL" => Ok(Calorimeter::Emcal),
            "DCAL" => Ok(Calorimeter::Dcal),
            "PHOS" => Ok(Calorimeter::Phos),
            _ => Err(format!(
                "Invalid calorimeter: '{}'. Expected: EMCAL, DCAL or PHOS",
                s
            )),
        }
    }
}

impl From<String> for Calorimeter {
    fn from(value: String) -> Self {
        Calorimeter::parse_lenient(&value)
    }
}

impl From<Calorimeter> for String {
    fn from(value: Calorimeter) -> Self {
        value.as_str().to_string()
    }
}

// ============================================================================
// Input data kind
// ============================================================================

/// Event data format delivered by the input handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataKind {
    Esd,
    #[default]
    Aod,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Esd => "ESD",
            DataKind::Aod => "AOD",
        }
    }

    /// Parse without failing: unknown kinds fall back to AOD with a warning.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_else(|err: String| {
            warn!("{}; falling back to '{}'", err, DataKind::Aod);
            DataKind::Aod
        })
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ESD" => Ok(DataKind::Esd),
            "AOD" => Ok(DataKind::Aod),
            _ => Err(format!("Data not known: '{}'. Expected: ESD or AOD", s)),
        }
    }
}

// ============================================================================
// Trigger bits
// ============================================================================

/// Offline event-trigger bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct TriggerMask(u32);

impl TriggerMask {
    pub const MB: TriggerMask = TriggerMask(1 << 0);
    pub const INT7: TriggerMask = TriggerMask(1 << 1);
    pub const EMC1: TriggerMask = TriggerMask(1 << 4);
    pub const INT5: TriggerMask = TriggerMask(1 << 5);
    pub const EMC7: TriggerMask = TriggerMask(1 << 10);
    pub const PHI7: TriggerMask = TriggerMask(1 << 13);
    pub const EMCEJE: TriggerMask = TriggerMask(1 << 14);
    pub const EMCEGA: TriggerMask = TriggerMask(1 << 15);
    pub const CENTRAL: TriggerMask = TriggerMask(1 << 16);
    pub const SEMI_CENTRAL: TriggerMask = TriggerMask(1 << 17);
    pub const SPI7: TriggerMask = TriggerMask(1 << 20);
    pub const INT8: TriggerMask = TriggerMask(1 << 21);
    pub const ANY: TriggerMask = TriggerMask(u32::MAX);

    /// Every single-bit class, in bit order.
    pub const NAMED: [(&'static str, TriggerMask); 12] = [
        ("MB", Self::MB),
        ("INT7", Self::INT7),
        ("EMC1", Self::EMC1),
        ("INT5", Self::INT5),
        ("EMC7", Self::EMC7),
        ("PHI7", Self::PHI7),
        ("EMCEJE", Self::EMCEJE),
        ("EMCEGA", Self::EMCEGA),
        ("Central", Self::CENTRAL),
        ("SemiCentral", Self::SEMI_CENTRAL),
        ("SPI7", Self::SPI7),
        ("INT8", Self::INT8),
    ];

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub fn is_any(&self) -> bool {
        self.0 == u32::MAX
    }

    pub fn contains(&self, other: TriggerMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for TriggerMask {
    type Output = TriggerMask;

    fn bitor(self, rhs: TriggerMask) -> TriggerMask {
        TriggerMask(self.0 | rhs.0)
    }
}

impl fmt::Display for TriggerMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

// ============================================================================
// Output container kinds
// ============================================================================

/// Role of a container created for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    /// Shared event input
    Input,
    /// Per-task result list, merged at the end of the job
    Output,
    /// Per-task configuration record
    Param,
}

impl ContainerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Input => "input",
            ContainerKind::Output => "output",
            ContainerKind::Param => "param",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
