//! The trajectory analysis framework.
//!
//! [`settings::AnalysisSettings`] collects what a module needs; [`runner::RunnerCommon`]
//! turns those needs into loaded topology, an opened trajectory, and frames prepared
//! for analysis. Everything else here supports those two: option declarations, time
//! units, plot settings, the module contract and its output series.

pub mod data;
pub mod error;
pub mod module;
pub mod options;
pub mod plot;
pub mod progress;
pub mod provider;
pub mod runner;
pub mod settings;
pub mod time;
pub mod topology_info;
pub mod trajectory;
