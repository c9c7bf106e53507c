//! Tag-driven directory reorganization.
//!
//! Two phases: `ActionPlanner` turns a batch of files into an `ActionLog`
//! (scheduling, then `finalize()` for aggregate directory names), and
//! `ActionExecutor` applies the log through a `DirectoryOps` port.

pub mod action;
pub mod aggregate;
pub mod executor;
pub mod planner;
pub mod track;

pub use action::{describe, ActionDescription, ActionKind, ActionLog, RenameAction};
pub use aggregate::{keeps_directory_shape, placeholder, AggregateKind, AggregationContext};
pub use executor::{ActionExecutor, ActionFailure, ExecutionReport};
pub use planner::{ActionPlanner, NewDirname, RenameMode, MAX_NEW_LEVELS, MAX_RENAME_HOPS, MAX_ROUNDS};
pub use track::{Expansion, FileHandle, MetadataSource, TrackFile};
