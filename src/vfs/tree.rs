//! The directory-tree engine: arena-allocated nodes, path-qualified
//! directory operations and the per-node file-mount registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::core::{Result, VfsError};
use crate::vfs::handle::MountedFile;
use crate::vfs::path::{self, Step};

/// Identifier of a directory node inside a [`MountFS`].
///
/// Ids are handed out by directory creation and stay valid until the node
/// is removed from the tree. Any node may act as a traversal root for the
/// `*_at` operations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct DirNode {
    parent: Option<NodeId>, // None exactly for the root
    dirs: BTreeMap<String, NodeId>,
    files: BTreeMap<String, Arc<MountedFile>>,
}

impl DirNode {
    fn new(parent: Option<NodeId>) -> Self {
        Self {
            parent,
            dirs: BTreeMap::new(),
            files: BTreeMap::new(),
        }
    }
}

/// An in-memory namespace tree with reference-counted file mounts.
///
/// `MountFS` unifies heterogeneous content sources under one slash-delimited
/// path space: any [`Content`](crate::Content) backend can be wrapped into a
/// [`MountedFile`] and mounted at a path, independent of where the bytes
/// actually live.
///
/// ### Internal state
///
/// * Nodes live in an arena (`nodes`) and are addressed by [`NodeId`];
///   slot 0 is the root and is never freed. Removed slots are recycled
///   through a free list.
/// * Each node owns a map of child directories and a map of file mounts.
///   The navigation names `""`, `.` and `..` are resolved by the path
///   layer and never appear in either map.
///
/// ### Invariants
///
/// 1. The child-directory graph is a tree; every non-root parent chain
///    terminates at the root.
/// 2. A handle's reference count equals the number of tree locations
///    currently holding it.
/// 3. A node is *empty* iff it has no file mounts and no child directories.
///
/// ### Thread safety
///
/// Not safe for unsynchronized concurrent mutation. The type is `Send` and
/// `Sync`, so a coarse external lock (`Mutex`/`RwLock`) is sufficient;
/// handle counts stay correct under such locking because they are atomic.
///
/// ### Example
///
/// ```
/// use overlay_kit::{MemoryContent, MountFS, MountedFile};
///
/// let mut fs = MountFS::new();
/// fs.mkdir("assets/maps", true).unwrap();
///
/// let handle = MountedFile::new(MemoryContent::new(b"tile data".to_vec()));
/// fs.mount("assets/maps/level1.bin", handle.clone(), false, false).unwrap();
///
/// assert!(fs.file_exists("assets/maps/level1.bin"));
/// assert_eq!(handle.ref_count(), 1);
/// ```
#[derive(Debug)]
pub struct MountFS {
    nodes: Vec<Option<DirNode>>,
    free: Vec<usize>,
}

impl MountFS {
    const ROOT: NodeId = NodeId(0);

    /// Creates a tree holding only the empty root directory.
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(DirNode::new(None))],
            free: Vec::new(),
        }
    }

    /// Identifier of the root node.
    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    fn node(&self, id: NodeId) -> &DirNode {
        self.nodes[id.0].as_ref().unwrap() // ids of removed nodes are never re-exposed
    }

    fn node_mut(&mut self, id: NodeId) -> &mut DirNode {
        self.nodes[id.0].as_mut().unwrap()
    }

    fn alloc(&mut self, node: DirNode) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn insert_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = self.alloc(DirNode::new(Some(parent)));
        self.node_mut(parent).dirs.insert(name.to_string(), id);
        id
    }

    /// Applies one resolved step from `at`. `Up` at the root stays at the
    /// root, mirroring `..` semantics of a filesystem root.
    fn step(&self, at: NodeId, step: Step<'_>) -> Option<NodeId> {
        match step {
            Step::Stay => Some(at),
            Step::Up => Some(self.node(at).parent.unwrap_or(at)),
            Step::Down(name) => self.node(at).dirs.get(name).copied(),
        }
    }

    fn walk(&self, from: NodeId, steps: &[Step<'_>]) -> Option<NodeId> {
        let mut cur = from;
        for &s in steps {
            cur = self.step(cur, s)?;
        }
        Some(cur)
    }

    /// Resolves a directory path from `from`, or `None` if any segment is
    /// missing.
    pub(crate) fn resolve_dir_node(&self, from: NodeId, path: &str) -> Option<NodeId> {
        self.walk(from, &path::resolve_dir(path, self.depth(from)))
    }

    // ----- node queries -------------------------------------------------

    /// True iff `node` is the tree root.
    pub fn is_root(&self, node: NodeId) -> bool {
        self.node(node).parent.is_none()
    }

    /// Distance from the root: 0 at the root, else one more than the
    /// parent's depth.
    pub fn depth(&self, node: NodeId) -> usize {
        let mut depth = 0;
        let mut cur = node;
        while let Some(parent) = self.node(cur).parent {
            depth += 1;
            cur = parent;
        }
        depth
    }

    /// True iff `node` has no file mounts and no child directories.
    pub fn is_empty(&self, node: NodeId) -> bool {
        let node = self.node(node);
        node.files.is_empty() && node.dirs.is_empty()
    }

    // ----- directory operations -----------------------------------------

    /// Creates the directory named by `path`, resolved from the root.
    /// See [`mkdir_at`](Self::mkdir_at).
    pub fn mkdir(&mut self, path: &str, recursive: bool) -> Result<NodeId> {
        self.mkdir_at(Self::ROOT, path, recursive)
    }

    /// Creates the directory named by `path`, resolved from `from`.
    ///
    /// Missing intermediate segments are created only when `recursive` is
    /// set; the final segment is always created. If the target already
    /// exists it is returned unchanged — creation is idempotent and never
    /// errors on an existing directory.
    ///
    /// Fails with [`VfsError::InvalidPath`] for an empty path and with
    /// [`VfsError::DirectoryNotFound`] for a missing intermediate segment
    /// without `recursive`.
    pub fn mkdir_at(&mut self, from: NodeId, path: &str, recursive: bool) -> Result<NodeId> {
        let steps = path::resolve_dir(path, self.depth(from));
        if steps.is_empty() {
            return Err(VfsError::InvalidPath {
                path: path.to_string(),
            });
        }

        let last = steps.len() - 1;
        let mut cur = from;
        for (i, &s) in steps.iter().enumerate() {
            cur = match s {
                Step::Stay => cur,
                Step::Up => self.node(cur).parent.unwrap_or(cur),
                Step::Down(name) => match self.node(cur).dirs.get(name).copied() {
                    Some(child) => child,
                    None if recursive || i == last => self.insert_child(cur, name),
                    None => {
                        return Err(VfsError::DirectoryNotFound {
                            path: path.to_string(),
                        });
                    }
                },
            };
        }
        debug!(path, "directory created");
        Ok(cur)
    }

    /// Removes the directory named by `path`, resolved from the root.
    /// See [`rmdir_at`](Self::rmdir_at).
    pub fn rmdir(&mut self, path: &str, recursive: bool) -> Result<()> {
        self.rmdir_at(Self::ROOT, path, recursive)
    }

    /// Removes the directory named by `path`, resolved from `from`.
    ///
    /// The final segment must name a real child directory: a node cannot
    /// remove itself or its parent, so paths ending in `""`, `.` or `..`
    /// fail with [`VfsError::InvalidPath`]. A non-empty target fails with
    /// [`VfsError::DirectoryNotEmpty`] unless `recursive` is set, in which
    /// case the whole subtree is unmounted (decrementing each handle once
    /// per mount) before the node is detached.
    pub fn rmdir_at(&mut self, from: NodeId, path: &str, recursive: bool) -> Result<()> {
        let steps = path::resolve_dir(path, self.depth(from));
        let (name, prefix) = match steps.split_last() {
            Some((&Step::Down(name), prefix)) => (name, prefix),
            _ => {
                return Err(VfsError::InvalidPath {
                    path: path.to_string(),
                });
            }
        };
        let parent = self
            .walk(from, prefix)
            .ok_or_else(|| VfsError::DirectoryNotFound {
                path: path.to_string(),
            })?;
        let target = self.node(parent).dirs.get(name).copied().ok_or_else(|| {
            VfsError::DirectoryNotFound {
                path: path.to_string(),
            }
        })?;

        if !self.is_empty(target) && !recursive {
            return Err(VfsError::DirectoryNotEmpty {
                path: path.to_string(),
            });
        }

        self.clean(target);
        self.node_mut(parent).dirs.remove(name);
        self.nodes[target.0] = None;
        self.free.push(target.0);
        debug!(path, "directory removed");
        Ok(())
    }

    /// Unmounts every file and detaches every child of `id`, recursively.
    /// Visits every descendant exactly once; this is the only path by which
    /// shared handles lose references during bulk removal.
    fn clean(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        let files = std::mem::take(&mut node.files);
        let dirs = std::mem::take(&mut node.dirs);
        for handle in files.values() {
            handle.release();
        }
        for (_, child) in dirs {
            self.clean(child);
            self.nodes[child.0] = None;
            self.free.push(child.0);
        }
    }

    /// True iff `path` resolves to an existing directory. Never errors.
    pub fn dir_exists(&self, path: &str) -> bool {
        self.dir_exists_at(Self::ROOT, path)
    }

    /// [`dir_exists`](Self::dir_exists), resolved from `from`.
    pub fn dir_exists_at(&self, from: NodeId, path: &str) -> bool {
        self.resolve_dir_node(from, path).is_some()
    }

    /// Child directory names at `path`, resolved from the root.
    /// See [`ls_dirs_at`](Self::ls_dirs_at).
    pub fn ls_dirs(&self, path: &str, include_special: bool) -> Vec<String> {
        self.ls_dirs_at(Self::ROOT, path, include_special)
    }

    /// Child directory names at the resolved node.
    ///
    /// The empty navigation name never appears. `.` and `..` and any name
    /// beginning with a dot are listed only when `include_special` is set.
    /// Returns an empty vector if the path does not resolve.
    pub fn ls_dirs_at(&self, from: NodeId, path: &str, include_special: bool) -> Vec<String> {
        let Some(at) = self.resolve_dir_node(from, path) else {
            return Vec::new();
        };
        let mut names = Vec::new();
        if include_special {
            names.push(".".to_string());
            names.push("..".to_string());
        }
        for name in self.node(at).dirs.keys() {
            if include_special || !name.starts_with('.') {
                names.push(name.clone());
            }
        }
        names
    }

    /// File names at `path`, resolved from the root.
    /// See [`ls_files_at`](Self::ls_files_at).
    pub fn ls_files(&self, path: &str) -> Vec<String> {
        self.ls_files_at(Self::ROOT, path)
    }

    /// File names at the resolved node; empty if the path does not resolve.
    pub fn ls_files_at(&self, from: NodeId, path: &str) -> Vec<String> {
        match self.resolve_dir_node(from, path) {
            Some(at) => self.node(at).files.keys().cloned().collect(),
            None => Vec::new(),
        }
    }

    // ----- file mount registry ------------------------------------------

    /// Mounts `handle` at `path`, resolved from the root.
    /// See [`mount_at`](Self::mount_at).
    pub fn mount(
        &mut self,
        path: &str,
        handle: Arc<MountedFile>,
        overwrite: bool,
        create_dirs: bool,
    ) -> Result<()> {
        self.mount_at(Self::ROOT, path, handle, overwrite, create_dirs)
    }

    /// Mounts `handle` at `path`, resolved from `from`.
    ///
    /// The path must end in a file name: empty paths and trailing
    /// separators fail with [`VfsError::InvalidPath`]. Missing intermediate
    /// directories are created only when `create_dirs` is set, else the
    /// call fails with [`VfsError::DirectoryNotFound`]. An occupied target
    /// is replaced when `overwrite` is set (the old handle loses its
    /// reference), else the call fails with
    /// [`VfsError::FileAlreadyExists`]. On success the handle's reference
    /// count is incremented exactly once.
    pub fn mount_at(
        &mut self,
        from: NodeId,
        path: &str,
        handle: Arc<MountedFile>,
        overwrite: bool,
        create_dirs: bool,
    ) -> Result<()> {
        let steps = path::resolve_file(path, self.depth(from))?;
        let (name, prefix) = match steps.split_last() {
            Some((&Step::Down(name), prefix)) => (name, prefix),
            _ => {
                return Err(VfsError::InvalidPath {
                    path: path.to_string(),
                });
            }
        };

        let mut cur = from;
        for &s in prefix {
            cur = match s {
                Step::Stay => cur,
                Step::Up => self.node(cur).parent.unwrap_or(cur),
                Step::Down(seg) => match self.node(cur).dirs.get(seg).copied() {
                    Some(child) => child,
                    None if create_dirs => self.insert_child(cur, seg),
                    None => {
                        return Err(VfsError::DirectoryNotFound {
                            path: path.to_string(),
                        });
                    }
                },
            };
        }

        let dir = self.node_mut(cur);
        if dir.files.contains_key(name) {
            if !overwrite {
                return Err(VfsError::FileAlreadyExists {
                    path: path.to_string(),
                });
            }
            if let Some(old) = dir.files.remove(name) {
                old.release();
            }
        }
        handle.acquire();
        self.node_mut(cur).files.insert(name.to_string(), handle);
        debug!(path, "file mounted");
        Ok(())
    }

    /// Unmounts the file at `path`, resolved from the root.
    /// See [`unmount_at`](Self::unmount_at).
    pub fn unmount(&mut self, path: &str) -> Option<Arc<MountedFile>> {
        self.unmount_at(Self::ROOT, path)
    }

    /// Unmounts the file at `path`, resolved from `from`.
    ///
    /// Returns the previously mounted handle after decrementing its
    /// reference count. Absence is a normal result: `None` is returned for
    /// an empty or malformed path, a missing intermediate directory, or an
    /// unoccupied target.
    pub fn unmount_at(&mut self, from: NodeId, path: &str) -> Option<Arc<MountedFile>> {
        let steps = path::resolve_file(path, self.depth(from)).ok()?;
        let (name, prefix) = match steps.split_last() {
            Some((&Step::Down(name), prefix)) => (name, prefix),
            _ => return None,
        };
        let dir = self.walk(from, prefix)?;
        let handle = self.node_mut(dir).files.remove(name)?;
        handle.release();
        debug!(path, "file unmounted");
        Some(handle)
    }

    /// True iff a file is mounted at `path`. Never errors.
    pub fn file_exists(&self, path: &str) -> bool {
        self.file_exists_at(Self::ROOT, path)
    }

    /// [`file_exists`](Self::file_exists), resolved from `from`.
    pub fn file_exists_at(&self, from: NodeId, path: &str) -> bool {
        self.get_at(from, path).is_some()
    }

    /// The handle mounted at `path`, or `None`. Never errors.
    pub fn get(&self, path: &str) -> Option<Arc<MountedFile>> {
        self.get_at(Self::ROOT, path)
    }

    /// [`get`](Self::get), resolved from `from`.
    pub fn get_at(&self, from: NodeId, path: &str) -> Option<Arc<MountedFile>> {
        let steps = path::resolve_file(path, self.depth(from)).ok()?;
        let (name, prefix) = match steps.split_last() {
            Some((&Step::Down(name), prefix)) => (name, prefix),
            _ => return None,
        };
        let dir = self.walk(from, prefix)?;
        self.node(dir).files.get(name).cloned()
    }
}

impl Default for MountFS {
    fn default() -> Self {
        Self::new()
    }
}
