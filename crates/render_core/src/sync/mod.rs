//! GPU synchronization primitives used to guard reuse of pooled resources.

mod fence;

pub use fence::{Fence, FenceId, FenceTable, Lockable};
