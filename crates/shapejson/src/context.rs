//! Per-call state threaded through the recursion.

use crate::filter::Options;
use crate::types::Identity;

/// Options plus the ancestor stack of one top-level call.
///
/// Created fresh per call and passed down by reference; never shared between
/// calls or threads.
#[derive(Debug, Clone, Default)]
pub struct Context {
    options: Options,
    ancestors: Vec<Identity>,
    root_depth: usize,
}

impl Context {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            ancestors: Vec::new(),
            root_depth: 0,
        }
    }

    /// Start with `ancestors` already open, outermost first. A value on the
    /// path that matches one of them is written as a cycle marker.
    pub fn with_ancestors<I>(options: Options, ancestors: I) -> Self
    where
        I: IntoIterator<Item = Identity>,
    {
        let ancestors: Vec<Identity> = ancestors.into_iter().collect();
        Self {
            options,
            root_depth: ancestors.len(),
            ancestors,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Number of containers currently open on the serialization path.
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    /// Nesting below the value a call started from; drives pretty indentation.
    pub(crate) fn level(&self) -> usize {
        self.depth().saturating_sub(self.root_depth)
    }

    /// Treat the current stack top as the root of a new call. Returns the
    /// previous root depth for [`restore_root`](Self::restore_root).
    pub(crate) fn enter_root(&mut self) -> usize {
        std::mem::replace(&mut self.root_depth, self.ancestors.len())
    }

    pub(crate) fn restore_root(&mut self, root_depth: usize) {
        self.root_depth = root_depth;
    }

    /// Stack index of `identity` if it is already being serialized.
    pub(crate) fn ancestor_depth(&self, identity: Identity) -> Option<usize> {
        self.ancestors.iter().position(|a| *a == identity)
    }

    pub(crate) fn push_ancestor(&mut self, identity: Identity) {
        self.ancestors.push(identity);
    }

    pub(crate) fn pop_ancestor(&mut self) {
        self.ancestors.pop();
    }
}
