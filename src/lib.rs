//! # HAT-RS: Asset Quality-Assurance Engine
//!
//! Rule-based validation of 3D asset scenes before they are published to an
//! asset library, plus the tooling around it:
//!
//! - **Checks**: a catalog of independent rules, discovered into a registry
//!   and run against a host scene with per-check failure isolation
//! - **Reports**: ordered, severity-graded results persisted into the scene
//! - **Slug renaming**: a planned, previewable rename of an asset's textures,
//!   datablocks, save file and folder
//! - **Folder structure**: validation of the asset folder layout
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         API Layer                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Core Engine   │   Checks      │   Scene Host  │    I/O      │
//! │                │               │               │             │
//! │ • Registry     │ • General     │ • Host trait  │ • Checklist │
//! │ • Pipeline     │ • Materials   │ • Snapshot    │ • Folders   │
//! │ • Rename       │ • Geometry    │ • Paths       │ • Cleanup   │
//! │ • Config       │ • Files, ...  │               │             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hat_rs::{HatEngine, SceneSnapshot};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = HatEngine::with_defaults()?;
//!     let mut scene = SceneSnapshot::load("rock_01/rock_01.blend")?;
//!     let outcome = engine.run_checks(&mut scene, false)?;
//!
//!     println!("{} entries, worst: {}", outcome.report.len(), outcome.worst());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core engine modules
pub mod core {
    //! Naming rules, reports, check orchestration and slug renaming.

    pub mod config;
    pub mod errors;
    pub mod naming;
    pub mod pipeline;
    pub mod registry;
    pub mod rename;
    pub mod report;
    pub mod severity;
}

// Built-in validation rules
pub mod checks;

// Host scene abstraction
pub mod scene;

// File system operations around an asset
pub mod io {
    //! README checklist, folder layout validation and scene cleanups.

    pub mod checklist;
    pub mod folder_structure;
    pub mod maintenance;
}

// Public API and engine interface
pub mod api {
    //! High-level API and engine interface.

    pub mod engine;
}

// Re-export primary types for convenience
pub use api::engine::HatEngine;
pub use core::config::HatConfig;
pub use core::errors::{HatError, Result, ResultExt};
pub use core::pipeline::{run_all, RunOptions, RunOutcome};
pub use core::registry::CheckRegistry;
pub use core::rename::{RenameAction, RenameEngine, RenameOutcome, RenamePlan, RenameState};
pub use core::report::{CheckResult, Report};
pub use core::severity::Severity;
pub use scene::{AssetType, SceneHost, SceneSnapshot};
