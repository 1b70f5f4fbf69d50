//! Shared contract surface of the crate: the error taxonomy, the content
//! capability implemented by backends and the bulk-source capability consumed
//! by [`MountFS::mount_bulk`](crate::MountFS::mount_bulk).

use std::io::{Read, Seek};
use std::sync::Arc;

use thiserror::Error;

use crate::MountedFile;

pub type Result<T> = std::result::Result<T, VfsError>;

/// Errors raised by tree operations and content backends.
///
/// Existence queries and listings never produce these for "not found"
/// conditions; errors are reserved for malformed input and genuine failures.
#[derive(Error, Debug)]
pub enum VfsError {
    /// Empty path where a non-empty one is required, an attempt to remove
    /// a self/parent entry directly, or a trailing separator where a file
    /// name is required.
    #[error("invalid path: {path:?}")]
    InvalidPath { path: String },

    /// An intermediate path segment does not name an existing directory and
    /// directory creation is disabled for the call.
    #[error("directory not found: {path:?}")]
    DirectoryNotFound { path: String },

    /// The mount target is already occupied and overwrite was not requested.
    #[error("file already exists: {path:?}")]
    FileAlreadyExists { path: String },

    /// Non-recursive removal of a directory that still has contents.
    #[error("directory not empty: {path:?}")]
    DirectoryNotEmpty { path: String },

    /// A content backend was accessed while invalid.
    #[error("content is not valid")]
    InvalidContent,

    /// The destination buffer cannot hold the backend's content.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// I/O failure propagated from a backend stream.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl VfsError {
    pub fn is_invalid_path(&self) -> bool {
        matches!(self, Self::InvalidPath { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DirectoryNotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::FileAlreadyExists { .. })
    }

    pub fn is_not_empty(&self) -> bool {
        matches!(self, Self::DirectoryNotEmpty { .. })
    }
}

/// A readable, seekable byte stream handed out by content backends.
pub trait ReadStream: Read + Seek {}

impl<T: Read + Seek> ReadStream for T {}

/// The minimal capability a backend must provide to be mountable.
///
/// The tree itself never reads content; it only stores handles. These
/// methods are exercised by application code after a
/// [`get`](crate::MountFS::get) lookup.
pub trait Content {
    /// Content length in bytes. Must return 0, never an error, when the
    /// backing content is invalid.
    fn size(&self) -> u64;

    /// Whether the backing content can currently be read.
    fn is_valid(&self) -> bool;

    /// Copies the whole content into `buf` starting at `offset`.
    ///
    /// Returns the number of bytes written. Fails with
    /// [`VfsError::InvalidContent`] if the content is invalid, or
    /// [`VfsError::BufferTooSmall`] if `buf.len() - offset` is less than
    /// [`size()`](Content::size).
    fn read_into(&self, buf: &mut [u8], offset: usize) -> Result<usize>;

    /// Opens a read-only stream over the content.
    ///
    /// Fails with [`VfsError::InvalidContent`] if the content is invalid.
    fn open_stream(&self) -> Result<Box<dyn ReadStream + '_>>;
}

/// Why a single item of a bulk insertion could not be mounted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InsertFailure {
    /// The target path was already occupied (possibly by an earlier item of
    /// the same batch) and overwrite was disabled.
    FileAlreadyExists,
    /// An intermediate directory was missing and directory creation was
    /// disabled.
    DirectoryNotFound,
    /// The produced path was malformed (empty, or no file name).
    BadPath,
}

/// A producer of many `(path, content)` pairs for one-shot mass population
/// of the tree, plus a failure-reporting hook.
///
/// Paths are interpreted relative to the base directory passed to
/// [`mount_bulk`](crate::MountFS::mount_bulk).
pub trait BulkSource {
    /// A finite sequence of `(desired path, handle)` pairs. Called once per
    /// bulk insertion; may be restarted by a later call.
    fn items(&mut self) -> Box<dyn Iterator<Item = (String, Arc<MountedFile>)> + '_>;

    /// Invoked once per item that could not be mounted. The batch continues
    /// after the callback returns.
    fn on_insert_failure(&mut self, path: &str, handle: &Arc<MountedFile>, reason: InsertFailure);
}
