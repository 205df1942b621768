use std::collections::HashSet;

use core_types::{DataType, TensorDesc, DEFAULT_WIDENINGS};
use tracing::warn;

/// Whitelist of implicit dtype conversions the resolver may apply.
///
/// A pair `(from, to)` lets a call carrying `from` be served by a kernel
/// registered for `to`. Pairs are not transitive. Layouts never convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionTable {
    pairs: HashSet<(DataType, DataType)>,
}

impl PromotionTable {
    /// Exact matching only
    pub fn exact_only() -> Self {
        Self { pairs: HashSet::new() }
    }

    /// The widening promotions declared in `supported_types.yaml`
    pub fn widening() -> Self {
        Self { pairs: DEFAULT_WIDENINGS.iter().copied().collect() }
    }

    /// Whitelist `from -> to`. Narrowing pairs are accepted but logged.
    pub fn allow(&mut self, from: DataType, to: DataType) -> &mut Self {
        if from != to {
            if to.size_in_bytes() < from.size_in_bytes() {
                warn!(%from, %to, "whitelisting a narrowing promotion");
            }
            self.pairs.insert((from, to));
        }
        self
    }

    pub fn with(mut self, from: DataType, to: DataType) -> Self {
        self.allow(from, to);
        self
    }

    pub fn permits(&self, from: DataType, to: DataType) -> bool {
        from == to || self.pairs.contains(&(from, to))
    }

    /// Can a `requested` slot be served by a kernel declaring `registered`?
    pub fn slot_accepts(&self, requested: TensorDesc, registered: TensorDesc) -> bool {
        requested.layout == registered.layout && self.permits(requested.dtype, registered.dtype)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Default for PromotionTable {
    fn default() -> Self {
        Self::widening()
    }
}
