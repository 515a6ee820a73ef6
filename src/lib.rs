//! GTD task manager: inline task syntax, a file-backed store and a
//! TaskWarrior / TaskChampion import and export bridge.

pub mod build_info;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod output;
pub mod store;
pub mod syntax;
pub mod taskwarrior;
pub mod views;
