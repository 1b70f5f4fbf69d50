mod bulk;
mod handle;
mod mem;
mod path;
mod range;
mod tree;

pub use handle::MountedFile;
pub use mem::MemoryContent;
pub use range::RangeStream;
pub use tree::{MountFS, NodeId};
