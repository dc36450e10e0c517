//! Recursive builder that orchestrates [`ChildIter`], the [`crate::geom`]
//! predicates, the dedup [`HashTable`], and [`Link`] creation to produce a
//! [`PatternTree`].
//!
//! The recursion bottoms out at `depth >= params.max_depth` — not at
//! `num_levels()` (`max_depth + 1`), which is a reporting convenience for
//! the tree's public API, not the generator's own stopping condition. With
//! `max_depth = 1` the very first call returns immediately: the root gets
//! no children, matching the trivial-tree worked example.
//!
//! A hash-table hit whose bits normalize identically to an ancestor on the
//! current build path (the all-zero pattern is a fixed point of the
//! doubling step, so it recurs at every depth) is never linked to — only
//! dropped — since the DAG's own invariant requires every child to be
//! strictly deeper than its parent.

use super::{BuildStats, PatternTree};
use crate::err::Result;
use crate::geom::{line_check, slope_check};
use crate::params::TreeParam;
use crate::pattern::{Bits, ChildIter, HashTable, Link, Pattern, PatternId, PatternNode};

/// Builds the full pattern DAG for `params`, returning an in-memory
/// [`PatternTree`] — no serialize/deserialize round trip required to use
/// the tree in-process.
pub fn generate(params: &TreeParam) -> Result<PatternTree> {
	params.validate()?;
	let zpos = params.normalized_zpos();
	let n_planes = zpos.len();
	let n_levels = params.max_depth + 1;

	debug!(
		max_depth = params.max_depth,
		width = params.width,
		n_planes,
		max_slope = params.max_slope,
		"generating pattern tree"
	);

	let mut nodes: Vec<PatternNode> = Vec::new();
	let root_pattern = Pattern::root(n_planes);
	let mut table = HashTable::with_levels(n_levels);
	table.insert(Bits::from_slice(root_pattern.bits()), 0);
	nodes.push(PatternNode::new(root_pattern, 0));
	let root_id: PatternId = 0;

	let mut max_depth_reached = 0u32;
	make_child_nodes(&mut nodes, &mut table, &zpos, params, root_id, 1, &mut max_depth_reached, &[]);

	let link_count = nodes.iter().map(|n| n.links().len()).sum();
	let stats = BuildStats {
		pattern_count: nodes.len(),
		link_count,
		max_depth_reached,
	};

	debug!(
		pattern_count = stats.pattern_count,
		link_count = stats.link_count,
		max_depth_reached,
		"generated pattern tree"
	);

	Ok(PatternTree::new(nodes, root_id, n_levels, zpos, params.width, stats))
}

/// `makeChildNodes` (§4.3): called with `depth` equal to the depth the
/// candidate children would occupy (one deeper than `parent_id`'s own
/// depth). `ancestors` is the root-to-`parent_id` path (exclusive of
/// `parent_id` itself) along the *current* recursion — used below to
/// reject a hash-table hit that resolves back onto that path instead of
/// forward into a strictly deeper node.
fn make_child_nodes(
	nodes: &mut Vec<PatternNode>,
	table: &mut HashTable,
	zpos: &[f64],
	params: &TreeParam,
	parent_id: PatternId,
	depth: u32,
	max_depth_reached: &mut u32,
	ancestors: &[PatternId],
) {
	// 1. Mark the parent's shallowest use.
	{
		let parent = &mut nodes[parent_id as usize];
		parent.min_depth = parent.min_depth.min(depth - 1);
	}
	*max_depth_reached = (*max_depth_reached).max(depth - 1);

	// 2. Stop descending once the configured depth budget is spent.
	if depth >= params.max_depth {
		return;
	}

	// 3. Populate this parent's children, once.
	if !nodes[parent_id as usize].has_children() {
		let parent_pattern = nodes[parent_id as usize].pattern.clone();
		let iter = ChildIter::new(&parent_pattern, params.width);
		let mut new_links: Vec<Link> = Vec::new();

		for (candidate, kind) in iter {
			if let Some(existing_id) = table.find(candidate.bits()) {
				// A degenerate (e.g. zero-width) candidate can normalize to
				// bits identical to `parent_id` itself or one of its own
				// ancestors on this path. Linking to it would be a back-edge
				// — children must be strictly deeper — so the candidate is
				// dropped rather than reused.
				if existing_id == parent_id || ancestors.contains(&existing_id) {
					continue;
				}
				let existing = &nodes[existing_id as usize];
				if depth >= existing.min_depth || slope_check(&existing.pattern, depth, params.max_slope) {
					new_links.push(Link::new(existing_id, kind));
				}
			} else if slope_check(&candidate, depth, params.max_slope) && line_check(&candidate, zpos) {
				let new_id = nodes.len() as PatternId;
				table.insert(Bits::from_slice(candidate.bits()), new_id);
				nodes.push(PatternNode::new(candidate, depth));
				new_links.push(Link::new(new_id, kind));
			}
		}

		for link in new_links {
			nodes[parent_id as usize].push_link(link);
		}
	}

	// 4. Recurse into any child that still needs deepening.
	let mut child_ancestors = ancestors.to_vec();
	child_ancestors.push(parent_id);
	let child_links: Vec<Link> = nodes[parent_id as usize].links().to_vec();
	for link in child_links {
		let child = &nodes[link.child as usize];
		if !child.has_children() || child.min_depth > depth {
			make_child_nodes(nodes, table, zpos, params, link.child, depth + 1, max_depth_reached, &child_ancestors);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::params::TreeParam;

	fn params(max_depth: u32, width: i32, max_slope: f64) -> TreeParam {
		TreeParam {
			max_depth,
			width,
			zpos: vec![0.0, 1.0],
			max_slope,
		}
	}

	#[test]
	fn trivial_tree_is_root_only() {
		let tree = generate(&params(1, 1, 0.0)).unwrap();
		assert_eq!(tree.pattern_count(), 1);
		assert_eq!(tree.node(tree.root_link().child).links().len(), 0);
	}

	#[test]
	fn depth_three_root_has_one_distinct_child() {
		// Of the 4 raw trial candidates, two normalize to the root's own
		// bits (the zero-width fixed point) and are dropped as back-edges;
		// the remaining two both resolve to the same shared child.
		let tree = generate(&params(3, 4, 1.0)).unwrap();
		let root = tree.node(tree.root_link().child);
		let distinct: std::collections::HashSet<_> = root.links().iter().map(|l| l.child).collect();
		assert_eq!(distinct.len(), 1);
	}

	#[test]
	fn generated_tree_has_no_back_edges() {
		fn assert_no_cycle(tree: &PatternTree, id: PatternId, path: &mut Vec<PatternId>) {
			assert!(!path.contains(&id), "node {id} linked to from its own ancestor path");
			path.push(id);
			for link in tree.node(id).links() {
				assert_no_cycle(tree, link.child, path);
			}
			path.pop();
		}

		for (max_depth, width, n_planes) in [(3, 4, 2), (4, 8, 3), (5, 16, 4)] {
			let tree = generate(&TreeParam {
				max_depth,
				width,
				zpos: (0..n_planes).map(|i| i as f64).collect(),
				max_slope: 1.0,
			})
			.unwrap();
			let mut path = Vec::new();
			assert_no_cycle(&tree, tree.root_link().child, &mut path);
		}
	}

	#[test]
	fn every_stored_pattern_is_canonical() {
		let tree = generate(&params(4, 8, 1.0)).unwrap();
		for id in 0..tree.pattern_count() as PatternId {
			assert!(tree.node(id).pattern.is_canonical());
		}
	}

	#[test]
	fn generation_is_deterministic() {
		let p = params(4, 8, 1.0);
		let a = generate(&p).unwrap();
		let b = generate(&p).unwrap();
		assert_eq!(a.pattern_count(), b.pattern_count());
		assert_eq!(a.stats.link_count, b.stats.link_count);
	}

	#[test]
	fn rejects_invalid_params() {
		let mut p = params(3, 4, 1.0);
		p.width = 0;
		assert!(generate(&p).is_err());
	}
}
