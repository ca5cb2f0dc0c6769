//! # TRAJAN Core Library
//!
//! A framework for sequential analysis of molecular simulation trajectories.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict layered architecture so that file handling, geometry,
//! and the analysis life cycle can be tested in isolation.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Topology`, `Frame`), periodic
//!   boundary geometry (`Pbc`, `WholeMolecules`), and readers for structure, trajectory,
//!   and index files.
//!
//! - **[`analysis`]: The Framework.** The settings object through which an analysis module
//!   declares its requirements, the option registry, and `RunnerCommon`, which sequences
//!   topology loading, trajectory reading, and per-frame preparation.
//!
//! - **[`workflows`]: The Public API.** `AnalysisSession` drives a module through every
//!   phase, from option registration to the final frame.
//!
//! - **[`modules`]: Reference Analyses.** Small analysis modules built on the framework.

pub mod analysis;
pub mod core;
pub mod modules;
pub mod workflows;
