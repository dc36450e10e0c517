//! Depth-first pre-order walker over the pattern DAG plus the
//! capability-based [`NodeVisitor`] abstraction that replaces the
//! inheritance-based visitor from the original design.

use super::PatternTree;
use crate::pattern::{Link, LINK_MIRROR, LINK_SHIFT};

/// A traversal snapshot: the [`Link`] just descended through, plus the
/// cumulative `shift`/`mirrored` state accumulated from the root along
/// this path. Pure and immutable — event-time concerns (`hits`, `used`)
/// live on [`crate::road::compare::Match`], which wraps one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeDescriptor {
	pub link: Link,
	pub depth: u32,
	pub shift: u64,
	pub mirrored: bool,
}

/// What a [`NodeVisitor`] tells [`TreeWalk`] to do after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitResult {
	/// Descend into this node's children.
	Recurse,
	/// Don't descend — used by the serializer to prune a subtree it has
	/// already emitted once.
	SkipChildren,
	/// Abort the walk entirely.
	Terminate,
}

/// A capability a [`TreeWalk`] dispatches to at every node: copy,
/// serialize, count, print, match against a [`crate::hit::Hitpattern`].
pub trait NodeVisitor {
	fn visit(&mut self, tree: &PatternTree, nd: &NodeDescriptor) -> VisitResult;
}

/// Depth-first pre-order traversal over a [`PatternTree`]'s DAG.
pub struct TreeWalk;

impl TreeWalk {
	pub fn run<V: NodeVisitor>(tree: &PatternTree, visitor: &mut V) -> VisitResult {
		walk_tree(tree, tree.root_link(), visitor)
	}
}

pub(crate) fn walk_tree<V: NodeVisitor>(tree: &PatternTree, root_link: Link, visitor: &mut V) -> VisitResult {
	let nd = NodeDescriptor {
		link: root_link,
		depth: 0,
		shift: 0,
		mirrored: false,
	};
	walk_node(tree, nd, visitor)
}

fn walk_node<V: NodeVisitor>(tree: &PatternTree, nd: NodeDescriptor, visitor: &mut V) -> VisitResult {
	match visitor.visit(tree, &nd) {
		VisitResult::Terminate => return VisitResult::Terminate,
		VisitResult::SkipChildren => return VisitResult::Recurse,
		VisitResult::Recurse => {}
	}

	// The tree has `numLevels()` resolution levels (root at depth 0); a
	// node at the deepest level is never descended past, which bounds the
	// walk even if a malformed tree (e.g. a deserialized one with a stray
	// back-reference) contained a link cycle.
	if nd.depth + 1 >= tree.num_levels() {
		return VisitResult::Recurse;
	}

	let node = tree.node(nd.link.child);
	for &link in node.links() {
		let child_nd = NodeDescriptor {
			link,
			depth: nd.depth + 1,
			shift: (nd.shift << 1) | ((link.kind & LINK_SHIFT) as u64),
			mirrored: nd.mirrored ^ (link.kind & LINK_MIRROR != 0),
		};
		if walk_node(tree, child_nd, visitor) == VisitResult::Terminate {
			return VisitResult::Terminate;
		}
	}
	VisitResult::Recurse
}

/// Counts every node reachable from the root, by discovery (pre-order)
/// position — used by tests to check the round-trip law "pattern count
/// reported by walking the tree equals the hash table's entry count".
pub struct CountVisitor {
	pub visited: std::collections::HashSet<crate::pattern::PatternId>,
}

impl CountVisitor {
	pub fn new() -> Self {
		Self {
			visited: std::collections::HashSet::new(),
		}
	}

	pub fn count(&self) -> usize {
		self.visited.len()
	}
}

impl Default for CountVisitor {
	fn default() -> Self {
		Self::new()
	}
}

impl NodeVisitor for CountVisitor {
	fn visit(&mut self, _tree: &PatternTree, nd: &NodeDescriptor) -> VisitResult {
		if !self.visited.insert(nd.link.child) {
			return VisitResult::SkipChildren;
		}
		VisitResult::Recurse
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::params::TreeParam;
	use crate::tree::generate;

	fn params(max_depth: u32, width: i32, max_slope: f64) -> TreeParam {
		TreeParam {
			max_depth,
			width,
			zpos: vec![0.0, 1.0],
			max_slope,
		}
	}

	#[test]
	fn count_visitor_matches_pattern_count() {
		let tree = generate(&params(4, 8, 1.0)).unwrap();
		let mut counter = CountVisitor::new();
		tree.walk(&mut counter);
		assert_eq!(counter.count(), tree.pattern_count());
	}

	#[test]
	fn terminate_aborts_immediately() {
		struct StopAtFirst {
			seen: u32,
		}
		impl NodeVisitor for StopAtFirst {
			fn visit(&mut self, _tree: &PatternTree, _nd: &NodeDescriptor) -> VisitResult {
				self.seen += 1;
				VisitResult::Terminate
			}
		}
		let tree = generate(&params(4, 8, 1.0)).unwrap();
		let mut v = StopAtFirst {
			seen: 0,
		};
		let result = TreeWalk::run(&tree, &mut v);
		assert_eq!(result, VisitResult::Terminate);
		assert_eq!(v.seen, 1);
	}

	#[test]
	fn walk_is_bounded_even_if_a_node_links_to_itself() {
		use crate::pattern::{Bits, Link, Pattern, PatternNode, LINK_NONE};
		use crate::tree::BuildStats;

		// A malformed (e.g. corrupt-deserialization) tree where a node
		// links back to itself must not make the walk recurse forever —
		// `num_levels()` bounds descent regardless of what the link graph
		// does.
		let mut node = PatternNode::new(Pattern::new(Bits::from_vec(vec![0, 0])), 0);
		node.push_link(Link::new(0, LINK_NONE));
		let tree = PatternTree::new(vec![node], 0, 3, vec![0.0, 1.0], 4, BuildStats::default());

		struct Counter(u32);
		impl NodeVisitor for Counter {
			fn visit(&mut self, _tree: &PatternTree, _nd: &NodeDescriptor) -> VisitResult {
				self.0 += 1;
				VisitResult::Recurse
			}
		}
		let mut counter = Counter(0);
		tree.walk(&mut counter);
		// Depths 0, 1, 2 each visited once before `num_levels() == 3` stops
		// further descent.
		assert_eq!(counter.0, 3);
	}
}
