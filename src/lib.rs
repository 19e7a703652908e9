//! Core library for `dir_edit`.
//!
//! Bulk rename and delete by editing a listing of file names. The pipeline is
//! snapshot -> listing -> (editor) -> plan -> resolve -> execute:
//! - [`listing`] turns entries into editable text and back;
//! - [`plan`] pairs old and new names and rejects unsafe edits;
//! - [`resolve`] orders the renames, breaking cycles through temporary names;
//! - [`executor`] applies the operations, or only prints them.
//!
//! Everything up to execution is pure, so a rejected edit never touches the
//! filesystem.

pub mod cli;
pub mod config;
pub mod editor;
pub mod entry;
pub mod errors;
pub mod executor;
pub mod fs_ops;
pub mod graph;
pub mod listing;
pub mod ops;
pub mod output;
pub mod plan;
pub mod platform;
pub mod resolve;
pub mod shutdown;
pub mod snapshot;

pub use config::{Config, LogLevel, default_config_path, load_config_from_xml_path, path_has_symlink_ancestor};
pub use entry::{Disposition, PathEntry, SnapshotEntry};
pub use errors::DirEditError;
pub use executor::{ExecutionMode, ExecutionReport, execute};
pub use listing::{Listing, ListingOptions, SortOrder};
pub use ops::Operation;
pub use plan::{BuildOptions, NestedPolicy, RenamePlan};
pub use resolve::{DiskProbe, EntryKind, MemoryProbe, PathProbe, ResolveOptions, resolve};
