//! Purpose: Hook callback and loader seams for on-link behavior.
//! Exports: `LinkedHook`, `HookLoader`.
//! Role: Boundary between the link annotator and hook-file storage/format.
//! Invariants: A load either fails fatally, yields no callback, or yields one callback.
//! Invariants: Loaders return a fresh callback per load; nothing leaks across loads.
use std::path::Path;

use crate::core::error::Error;
use crate::core::graph::BuildGraph;

/// Behavior attached to a library, fired when that library is linked into a
/// consumer. The callback receives the consuming target and may mutate the
/// graph; mutations are visible to dependencies processed later in the same
/// link call.
pub trait LinkedHook {
    fn on_linked_as_dependency(&self, graph: &mut BuildGraph, consumer: &str)
    -> Result<(), Error>;
}

/// Loads a hook file. `Ok(None)` means the file loaded cleanly but defines
/// no on-link callback; that is a soft no-op, not an error. A file that
/// cannot be read or parsed fails the whole configuration pass.
pub trait HookLoader {
    fn load(&self, path: &Path) -> Result<Option<Box<dyn LinkedHook>>, Error>;
}
