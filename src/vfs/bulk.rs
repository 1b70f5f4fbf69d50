//! Bulk insertion: drives a [`BulkSource`] of `(path, content)` pairs into
//! the tree, containing per-item failures as callbacks instead of aborting
//! the batch.

use std::sync::Arc;

use tracing::debug;

use crate::core::{BulkSource, InsertFailure, Result, VfsError};
use crate::vfs::handle::MountedFile;
use crate::vfs::path;
use crate::vfs::tree::{MountFS, NodeId};

impl MountFS {
    /// Bulk-mounts everything `source` produces under `base`, resolved from
    /// the root. See [`mount_bulk_at`](Self::mount_bulk_at).
    pub fn mount_bulk<S: BulkSource>(
        &mut self,
        base: &str,
        source: &mut S,
        overwrite: bool,
        create_dirs: bool,
    ) -> Result<usize> {
        self.mount_bulk_at(self.root(), base, source, overwrite, create_dirs)
    }

    /// Bulk-mounts everything `source` produces under `base`, resolved from
    /// `from`.
    ///
    /// The base directory is resolved first: with `create_dirs` it is
    /// created like a recursive directory-creation call; without it a
    /// missing base aborts the whole batch with
    /// [`VfsError::DirectoryNotFound`] before any item is processed — the
    /// only aborting failure. An empty base resolves to `from` itself.
    ///
    /// Every produced item is then mounted relative to the base with the
    /// same `overwrite` and `create_dirs` flags, as the source's iterator
    /// yields it; the batch is never held in memory as a whole. A failing
    /// item is classified and reported through
    /// [`on_insert_failure`](BulkSource::on_insert_failure), in production
    /// order, after the iterator is exhausted, and the batch continues;
    /// later items targeting a path filled earlier in the same batch report
    /// [`InsertFailure::FileAlreadyExists`] unless `overwrite` is set.
    ///
    /// Returns the number of successfully mounted items.
    pub fn mount_bulk_at<S: BulkSource>(
        &mut self,
        from: NodeId,
        base: &str,
        source: &mut S,
        overwrite: bool,
        create_dirs: bool,
    ) -> Result<usize> {
        let base_node = if path::resolve_dir(base, self.depth(from)).is_empty() {
            from
        } else if create_dirs {
            self.mkdir_at(from, base, true)?
        } else {
            self.resolve_dir_node(from, base)
                .ok_or_else(|| VfsError::DirectoryNotFound {
                    path: base.to_string(),
                })?
        };

        // Items are mounted as the iterator produces them, so the batch is
        // never materialized; only failures are held back, reported in
        // production order once the iterator is done (it borrows the
        // source until then).
        let mut failures: Vec<(String, Arc<MountedFile>, InsertFailure)> = Vec::new();
        let mut mounted = 0;
        let mut total = 0;
        for (item_path, handle) in source.items() {
            total += 1;
            match self.mount_at(base_node, &item_path, handle.clone(), overwrite, create_dirs) {
                Ok(()) => mounted += 1,
                Err(err) => {
                    let reason = match err {
                        VfsError::FileAlreadyExists { .. } => InsertFailure::FileAlreadyExists,
                        VfsError::DirectoryNotFound { .. } => InsertFailure::DirectoryNotFound,
                        _ => InsertFailure::BadPath,
                    };
                    failures.push((item_path, handle, reason));
                }
            }
        }
        for (item_path, handle, reason) in failures {
            source.on_insert_failure(&item_path, &handle, reason);
        }
        debug!(base, mounted, total, "bulk insertion finished");
        Ok(mounted)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{MemoryContent, MountedFile};

    /// A source over a fixed item list that records reported failures.
    struct VecSource {
        items: Vec<(String, Arc<MountedFile>)>,
        failures: Vec<(String, InsertFailure)>,
    }

    impl VecSource {
        fn new(paths: &[&str]) -> Self {
            let items = paths
                .iter()
                .map(|p| {
                    (
                        p.to_string(),
                        MountedFile::new(MemoryContent::new(b"item".to_vec())),
                    )
                })
                .collect();
            Self {
                items,
                failures: Vec::new(),
            }
        }
    }

    impl BulkSource for VecSource {
        fn items(&mut self) -> Box<dyn Iterator<Item = (String, Arc<MountedFile>)> + '_> {
            Box::new(self.items.iter().cloned())
        }

        fn on_insert_failure(
            &mut self,
            path: &str,
            _handle: &Arc<MountedFile>,
            reason: InsertFailure,
        ) {
            self.failures.push((path.to_string(), reason));
        }
    }

    #[test]
    fn test_partial_failures_are_reported_in_order() {
        let mut fs = MountFS::new();
        // Second item needs a missing directory, third has no name, fourth
        // duplicates the first within the same batch.
        let mut source = VecSource::new(&["ok", "bad/ok", "", "ok"]);

        let mounted = fs.mount_bulk("", &mut source, false, false).unwrap();

        assert_eq!(mounted, 1);
        assert!(fs.file_exists("ok"));
        assert_eq!(
            source.failures,
            vec![
                ("bad/ok".to_string(), InsertFailure::DirectoryNotFound),
                ("".to_string(), InsertFailure::BadPath),
                ("ok".to_string(), InsertFailure::FileAlreadyExists),
            ]
        );
    }

    /// Generates items on demand and records, while producing each next
    /// item, the mount reference count of the previous one.
    struct StreamingSource {
        produced: usize,
        prev_ref_counts: Vec<usize>,
    }

    struct StreamingIter<'a> {
        source: &'a mut StreamingSource,
        prev: Option<Arc<MountedFile>>,
    }

    impl Iterator for StreamingIter<'_> {
        type Item = (String, Arc<MountedFile>);

        fn next(&mut self) -> Option<Self::Item> {
            if let Some(prev) = &self.prev {
                self.source.prev_ref_counts.push(prev.ref_count());
            }
            if self.source.produced == 3 {
                return None;
            }
            let name = format!("g{}", self.source.produced);
            self.source.produced += 1;
            let handle = MountedFile::new(MemoryContent::new(b"item".to_vec()));
            self.prev = Some(handle.clone());
            Some((name, handle))
        }
    }

    impl BulkSource for StreamingSource {
        fn items(&mut self) -> Box<dyn Iterator<Item = (String, Arc<MountedFile>)> + '_> {
            Box::new(StreamingIter {
                source: self,
                prev: None,
            })
        }

        fn on_insert_failure(
            &mut self,
            _path: &str,
            _handle: &Arc<MountedFile>,
            _reason: InsertFailure,
        ) {
        }
    }

    #[test]
    fn test_items_are_mounted_as_they_are_produced() {
        let mut fs = MountFS::new();
        let mut source = StreamingSource {
            produced: 0,
            prev_ref_counts: Vec::new(),
        };

        let mounted = fs.mount_bulk("", &mut source, false, false).unwrap();

        assert_eq!(mounted, 3);
        assert!(fs.file_exists("g0"));
        assert!(fs.file_exists("g2"));
        // Each item was already mounted by the time the next one was
        // produced.
        assert_eq!(source.prev_ref_counts, vec![1, 1, 1]);
    }

    #[test]
    fn test_missing_base_aborts_before_any_item() {
        let mut fs = MountFS::new();
        let mut source = VecSource::new(&["a", "b"]);

        let result = fs.mount_bulk("missing/base", &mut source, false, false);

        assert!(result.unwrap_err().is_not_found());
        assert!(source.failures.is_empty());
        assert!(!fs.file_exists("missing/base/a"));
    }

    #[test]
    fn test_base_is_created_on_request() {
        let mut fs = MountFS::new();
        let mut source = VecSource::new(&["pack/level.bin", "pack/music.ogg"]);

        let mounted = fs.mount_bulk("assets/v1", &mut source, false, true).unwrap();

        assert_eq!(mounted, 2);
        assert!(fs.file_exists("assets/v1/pack/level.bin"));
        assert!(fs.file_exists("assets/v1/pack/music.ogg"));
        assert!(source.failures.is_empty());
    }

    #[test]
    fn test_existing_base_without_creation() {
        let mut fs = MountFS::new();
        fs.mkdir("data", false).unwrap();
        let mut source = VecSource::new(&["f"]);

        let mounted = fs.mount_bulk("data", &mut source, false, false).unwrap();
        assert_eq!(mounted, 1);
        assert!(fs.file_exists("data/f"));
    }

    #[test]
    fn test_overwrite_allows_in_batch_duplicates() {
        let mut fs = MountFS::new();
        let mut source = VecSource::new(&["same", "same"]);

        let mounted = fs.mount_bulk("", &mut source, true, false).unwrap();

        assert_eq!(mounted, 2);
        assert!(source.failures.is_empty());
        // Only the later handle keeps a reference.
        assert_eq!(source.items[0].1.ref_count(), 0);
        assert_eq!(source.items[1].1.ref_count(), 1);
    }

    #[test]
    fn test_bulk_relative_to_node() {
        let mut fs = MountFS::new();
        let sub = fs.mkdir("sub", false).unwrap();
        let mut source = VecSource::new(&["f"]);

        let mounted = fs
            .mount_bulk_at(sub, "inner", &mut source, false, true)
            .unwrap();

        assert_eq!(mounted, 1);
        assert!(fs.file_exists("sub/inner/f"));
    }

    #[test]
    fn test_source_is_restartable() {
        let mut fs = MountFS::new();
        let mut source = VecSource::new(&["f"]);

        fs.mount_bulk("one", &mut source, false, true).unwrap();
        let mounted = fs.mount_bulk("two", &mut source, false, true).unwrap();

        assert_eq!(mounted, 1);
        assert!(fs.file_exists("one/f"));
        assert!(fs.file_exists("two/f"));
    }
}
