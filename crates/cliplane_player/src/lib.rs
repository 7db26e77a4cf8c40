// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless player for Cliplane projects.
//!
//! Used by the `cliplane` binary; exposed as a library so the project
//! format and frame loop can be embedded elsewhere.

pub mod cli;
pub mod error;
pub mod project;
pub mod runner;

pub use cli::Cli;
pub use error::{PlayerError, ProjectError};
pub use project::{ProjectFile, RenderSize};
pub use runner::{RunReport, Runner};
