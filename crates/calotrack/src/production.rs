//! Grid production variables.
//!
//! Productions running on the grid export their collision system, data type,
//! production tag and anchor year through `ALIEN_JDL_LPM*` variables. When
//! present they take precedence over the caller-supplied flags.

use calotrack_protocol::defaults::DEFAULT_PERIOD;
use calotrack_protocol::{CollisionSystem, InputFlags};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

pub const INTERACTION_TYPE_VAR: &str = "ALIEN_JDL_LPMINTERACTIONTYPE";
pub const PRODUCTION_TYPE_VAR: &str = "ALIEN_JDL_LPMPRODUCTIONTYPE";
pub const PRODUCTION_TAG_VAR: &str = "ALIEN_JDL_LPMPRODUCTIONTAG";
pub const ANCHOR_YEAR_VAR: &str = "ALIEN_JDL_LPMANCHORYEAR";

/// Source of production variables.
pub trait ProductionEnv {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ProductionEnv for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl ProductionEnv for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Flags after the production override, plus the production period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionContext {
    pub period: String,
    pub flags: InputFlags,
}

/// Year encoded in an `LHCyy...` production tag.
pub fn year_from_tag(tag: &str) -> Option<i32> {
    let digits = tag.strip_prefix("LHC")?.get(..2)?;
    digits.parse::<i32>().ok().map(|yy| 2000 + yy)
}

/// Apply whatever production variables are set. Unset or empty variables
/// leave the corresponding flag untouched.
pub fn apply_production_variables(
    flags: &InputFlags,
    env: &dyn ProductionEnv,
) -> ProductionContext {
    let get = |name: &str| env.var(name).filter(|value| !value.trim().is_empty());
    let mut flags = flags.clone();
    let mut period = DEFAULT_PERIOD.to_string();

    if let Some(system) = get(INTERACTION_TYPE_VAR) {
        flags.collision = CollisionSystem::parse_lenient(system.trim());
    }

    if let Some(kind) = get(PRODUCTION_TYPE_VAR) {
        flags.simulation = kind.trim() == "MC";
    }

    if let Some(tag) = get(PRODUCTION_TAG_VAR) {
        period = tag.trim().to_string();
        if !flags.simulation {
            match year_from_tag(&period) {
                Some(year) => flags.year = year,
                None => warn!(
                    tag = %period,
                    "Production tag carries no year; keeping {}",
                    flags.year
                ),
            }
        }
    }

    if flags.simulation {
        if let Some(anchor) = get(ANCHOR_YEAR_VAR) {
            match anchor.trim().parse::<i32>() {
                Ok(year) => flags.year = year,
                Err(_) => warn!(anchor = %anchor, "Invalid anchor year; keeping {}", flags.year),
            }
        }
    }

    info!(
        period = %period,
        collision = %flags.collision,
        simulation = flags.simulation,
        year = flags.year,
        "Production settings"
    );
    ProductionContext { period, flags }
}
