//! Reference-counted mount handles.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::Content;

/// A mountable content handle, shared between every tree location it is
/// mounted at.
///
/// The reference count tracks how many distinct paths currently point at
/// the handle: incremented exactly once per successful mount, decremented
/// exactly once per unmount, including unmounts performed during recursive
/// directory removal. When the count reaches zero the owning collaborator
/// may reclaim the underlying content.
///
/// The count is atomic so that same-handle mounts and unmounts stay correct
/// when the tree is shared behind an external lock.
pub struct MountedFile {
    content: Box<dyn Content + Send + Sync>,
    refs: AtomicUsize,
}

impl MountedFile {
    /// Wraps a content backend into a shareable handle with a zero count.
    pub fn new(content: impl Content + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            content: Box::new(content),
            refs: AtomicUsize::new(0),
        })
    }

    /// Number of tree locations currently holding this handle.
    pub fn ref_count(&self) -> usize {
        self.refs.load(Ordering::Acquire)
    }

    /// The wrapped content capability.
    pub fn content(&self) -> &(dyn Content + Send + Sync) {
        self.content.as_ref()
    }

    pub(crate) fn acquire(&self) {
        self.refs.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn release(&self) {
        let prev = self.refs.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "mount reference count underflow");
    }
}

impl fmt::Debug for MountedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountedFile")
            .field("size", &self.content.size())
            .field("valid", &self.content.is_valid())
            .field("refs", &self.ref_count())
            .finish()
    }
}
