//! Shared vocabulary of the calotrack task setup.
//!
//! Everything the resolvers, the composer and the CLI agree on lives here:
//! - canonical enums for collision system, calorimeter, data kind and trigger bits
//! - the caller-supplied [`InputFlags`] record
//! - the artifact naming contract ([`derive_artifact_name`])
//! - default constants

pub mod defaults;
pub mod flags;
pub mod naming;
pub mod types;

pub use flags::{CentralityRange, InputFlags};
pub use naming::{derive_artifact_name, ArtifactName};
pub use types::{Calorimeter, CollisionSystem, ContainerKind, DataKind, DetectorFamily, TriggerMask};
