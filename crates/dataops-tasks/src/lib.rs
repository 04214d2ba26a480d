//! Task handlers for DataOps.
//!
//! Each handler implements the [`TaskHandler`] trait defined in [`traits`]:
//! it owns one well-known input path and one well-known output path under
//! the data root and performs a single deterministic transformation.
//!
//! Supporting modules:
//!
//! - [`operation`] -- the closed set of operation identifiers.
//! - [`fsio`] -- whole-file read/write helpers and data-root confinement.
//! - [`locks`] -- per-output-path mutual exclusion.
//! - [`process`] -- bounded subprocess execution for external tools.
//! - [`config`] -- data root and formatter settings.

pub mod config;
pub mod error;
pub mod fsio;
pub mod handlers;
pub mod locks;
pub mod operation;
pub mod process;
pub mod traits;

pub use config::{FormatterConfig, TaskConfig};
pub use error::{Result, TaskError};
pub use handlers::default_handlers;
pub use locks::PathLocks;
pub use operation::Operation;
pub use traits::{TaskHandler, TaskOutcome};
