//! Configuration resolution and container wiring for the calorimeter/track
//! correlation analysis tasks.
//!
//! Resolution is pure: [`resolve_reader`] and [`resolve_calibration`] map
//! [`InputFlags`](calotrack_protocol::InputFlags) onto immutable settings
//! records, [`compose`] joins them into a [`TaskDescriptor`], and the
//! `add_task_*` routines hand the result to an [`AnalysisManager`].

pub mod balance;
pub mod calo_utils;
pub mod compose;
pub mod config;
pub mod error;
pub mod manager;
pub mod production;
pub mod reader;
pub mod track_cuts;
pub mod trigger;

pub use balance::{add_task_balance_eff_cont, BalanceEffContOptions, BalanceTaskDescriptor};
pub use calo_utils::{resolve_calibration, CalibrationConfig};
pub use compose::{
    add_task_calo_track_corr_base, compose, registered_name, Collaborators, TaskDescriptor,
    TriggerRouting,
};
pub use error::{ComposeError, ConfigError, WiringError};
pub use manager::{AnalysisManager, AnalysisTask, ManagerGraph, RegisteredTask};
pub use reader::{resolve_reader, ReaderConfig};
