//! The pattern DAG itself: an arena of [`PatternNode`]s reachable from a
//! single root, built once by [`generator::generate`] and read-only
//! thereafter.

pub mod generator;
pub mod serialize;
pub mod walk;

pub use generator::generate;
pub use walk::{NodeDescriptor, NodeVisitor, TreeWalk, VisitResult};

use crate::pattern::{Link, PatternId, PatternNode, LINK_NONE};

/// Build-time statistics surfaced alongside a freshly generated tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildStats {
	pub pattern_count: usize,
	pub link_count: usize,
	pub max_depth_reached: u32,
}

/// A depth-independent, self-referential bit-pattern template database:
/// every bit pattern a bounded-slope straight line can produce across `N`
/// detector planes, at every resolution up to the tree's max depth.
pub struct PatternTree {
	nodes: Vec<PatternNode>,
	root: PatternId,
	n_levels: u32,
	zpos: Vec<f64>,
	width: i32,
	pub stats: BuildStats,
}

impl PatternTree {
	pub(crate) fn new(
		nodes: Vec<PatternNode>,
		root: PatternId,
		n_levels: u32,
		zpos: Vec<f64>,
		width: i32,
		stats: BuildStats,
	) -> Self {
		Self {
			nodes,
			root,
			n_levels,
			zpos,
			width,
			stats,
		}
	}

	pub fn num_levels(&self) -> u32 {
		self.n_levels
	}

	/// `maxDepth = numLevels - 1`: the deepest resolution level present.
	pub fn max_depth(&self) -> u32 {
		self.n_levels.saturating_sub(1)
	}

	pub fn num_planes(&self) -> usize {
		self.zpos.len()
	}

	pub fn zpos(&self) -> &[f64] {
		&self.zpos
	}

	/// The `width` bound the tree was generated with — the on-disk bin
	/// byte-width for serialization is derived from this, not from the
	/// widest bit a generated pattern happened to reach.
	pub fn width(&self) -> i32 {
		self.width
	}

	pub fn root_link(&self) -> Link {
		Link::new(self.root, LINK_NONE)
	}

	pub(crate) fn node(&self, id: PatternId) -> &PatternNode {
		&self.nodes[id as usize]
	}

	pub fn pattern_count(&self) -> usize {
		self.nodes.len()
	}

	/// Depth-first pre-order walk over the DAG, dispatching to `visitor`.
	pub fn walk<V: NodeVisitor>(&self, visitor: &mut V) -> VisitResult {
		walk::walk_tree(self, self.root_link(), visitor)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::params::TreeParam;

	fn trivial_params() -> TreeParam {
		TreeParam {
			max_depth: 1,
			width: 1,
			zpos: vec![0.0, 1.0],
			max_slope: 0.0,
		}
	}

	#[test]
	fn trivial_tree_has_single_root_pattern() {
		let tree = generate(&trivial_params()).unwrap();
		assert_eq!(tree.pattern_count(), 1);
		assert_eq!(tree.node(tree.root_link().child).links().len(), 0);
	}
}
