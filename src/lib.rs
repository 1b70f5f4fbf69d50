//! A lightweight in-memory virtual filesystem overlay for Rust.
//! Mounts arbitrary content sources (memory buffers, archive entries,
//! loose files) under unified slash-delimited paths and addresses them
//! through one consistent API, without touching the real OS filesystem.
//!
//! ### Overview
//!
//! `overlay-kit` keeps a namespace tree in memory: directories are real
//! nodes, files are reference-counted mounts of a [`Content`] backend.
//! It defines the generic `Content` capability and provides `MemoryContent`
//! as a buffer-backed implementation; backends over disk files or archive
//! entries plug in the same way.
//!
//! **Key ideas**:
//! - **Unification**: Heterogeneous data sources share one path space
//!   through a single API.
//! - **Shared mounts**: The same handle may be mounted at many paths; its
//!   reference count always equals the number of live mounts.
//! - **Faithful traversal**: `.`, `..`, repeated separators and absolute
//!   paths behave like they do on a real filesystem, from any node.
//! - **Contained bulk failures**: Mass population reports per-item
//!   failures through a callback instead of aborting the batch.
//!
//! ### Example
//!
//! ```
//! use overlay_kit::{MemoryContent, MountFS, MountedFile};
//!
//! let mut fs = MountFS::new();
//! fs.mkdir("config/overrides", true).unwrap();
//!
//! let handle = MountedFile::new(MemoryContent::new(b"debug = true".to_vec()));
//! fs.mount("config/overrides/dev.toml", handle, false, false).unwrap();
//!
//! assert!(fs.file_exists("config/overrides/dev.toml"));
//! assert_eq!(fs.ls_files("config/overrides"), vec!["dev.toml"]);
//! ```

mod core;
mod vfs;

pub use crate::core::{BulkSource, Content, InsertFailure, ReadStream, Result, VfsError};
pub use crate::vfs::{MemoryContent, MountFS, MountedFile, NodeId, RangeStream};
