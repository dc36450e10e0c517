//! Matches tree nodes against an event's [`Hitpattern`], yielding
//! `(NodeDescriptor, HitSet)` pairs subject to a missing-layer policy.

use std::cell::Cell;
use std::collections::HashSet;

use crate::hit::{Hitpattern, HitSet};
use crate::tree::{NodeDescriptor, NodeVisitor, PatternTree, VisitResult};

/// How much of a matched pattern's hit set has been claimed by a road.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsedState {
	NotConsumed = 0,
	Partial = 1,
	Full = 2,
}

/// A pattern that matched the event's hits, together with the hits that
/// satisfied it. `used` is the one field [`crate::road::RoadBuilder`]
/// mutates after the match is recorded — everything else is immutable,
/// so it's wrapped in a `Cell` rather than requiring `&mut` access to the
/// whole match map (see the design note on mutating "const" descriptors).
#[derive(Debug)]
pub struct Match {
	pub nd: NodeDescriptor,
	pub hits: HitSet,
	pub used: Cell<UsedState>,
}

/// The default missing-layer policy: a perfect match (no missing plane)
/// or exactly one missing plane, for any single plane.
pub fn default_layer_combos(n_planes: usize) -> HashSet<u32> {
	let mut combos = HashSet::new();
	combos.insert(0u32);
	for p in 0..n_planes {
		combos.insert(1u32 << p);
	}
	combos
}

/// Maps a pattern node's bit for `plane` to the `[start, start+len)` range
/// of finest-resolution [`Hitpattern`] bins it covers, accounting for the
/// node's cumulative `shift`/`mirrored` state. `Hitpattern` stores
/// `2^(maxDepth-1)` bins (§3); a tree node at `depth == maxDepth` resolves
/// one bit finer than that (the left/right wire-ambiguity bit), so it's
/// narrowed by one before comparison rather than given its own bin row.
pub(crate) fn bin_range(tree: &PatternTree, nd: &NodeDescriptor, plane: usize) -> (u32, u32) {
	let node = tree.node(nd.link.child);
	let bits = node.pattern.bits();
	let width = node.pattern.width();
	let b = bits[plane];
	let eff = if nd.mirrored { width - b } else { b };

	let max_depth = tree.max_depth();
	let hp_depth = max_depth.saturating_sub(1);
	let d_clamped = nd.depth.min(hp_depth);
	let extra = nd.depth - d_clamped;

	let mut at_clamped = nd.shift as i64 + eff as i64;
	if extra > 0 {
		at_clamped >>= extra;
	}
	let shift_amount = hp_depth - d_clamped;
	let start = (at_clamped.max(0) as u32) << shift_amount;
	let len = 1u32 << shift_amount;
	(start, len)
}

/// Walks the pattern tree recording every node whose missing-plane
/// bitmap is a member of `layer_combos`. Always returns `Recurse` —
/// children at finer resolution may refine a parent's match.
pub struct ComparePattern<'a> {
	hitpattern: &'a Hitpattern,
	layer_combos: &'a HashSet<u32>,
	matches: Vec<Match>,
}

impl<'a> ComparePattern<'a> {
	pub fn new(hitpattern: &'a Hitpattern, layer_combos: &'a HashSet<u32>) -> Self {
		Self {
			hitpattern,
			layer_combos,
			matches: Vec::new(),
		}
	}

	pub fn into_matches(self) -> Vec<Match> {
		self.matches
	}
}

impl<'a> NodeVisitor for ComparePattern<'a> {
	fn visit(&mut self, tree: &PatternTree, nd: &NodeDescriptor) -> VisitResult {
		let n_planes = self.hitpattern.n_planes();
		let mut missing: u32 = 0;
		let mut hits = HitSet::new();

		for plane in 0..n_planes {
			let (start, len) = bin_range(tree, nd, plane);
			if self.hitpattern.range_is_set(plane, start, len) {
				for hit in self.hitpattern.hits_in_range(plane, start, len) {
					hits.insert(hit);
				}
			} else {
				missing |= 1 << plane;
			}
		}

		if self.layer_combos.contains(&missing) {
			self.matches.push(Match {
				nd: *nd,
				hits,
				used: Cell::new(UsedState::NotConsumed),
			});
		}

		VisitResult::Recurse
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::hit::{Hit, PlaneRef};
	use crate::params::TreeParam;
	use crate::tree::generate;

	fn params() -> TreeParam {
		TreeParam {
			max_depth: 3,
			width: 4,
			zpos: vec![0.0, 0.5, 1.0],
			max_slope: 2.0,
		}
	}

	#[test]
	fn exact_hit_at_root_bin_matches_with_no_missing_planes() {
		let tree = generate(&params()).unwrap();
		let mut hp = Hitpattern::new(tree.num_planes(), tree.max_depth(), 0);
		for plane in 0..tree.num_planes() {
			let hit = Hit::new(PlaneRef::new(0, plane as u16), 0, 0.0, 0.5, 0.0);
			hp.set_hit(plane, 0, hit);
		}
		let combos = default_layer_combos(tree.num_planes());
		let mut cmp = ComparePattern::new(&hp, &combos);
		tree.walk(&mut cmp);
		let matches = cmp.into_matches();
		assert!(matches.iter().any(|m| m.nd.depth == 0));
	}

	#[test]
	fn no_hits_rejects_every_node() {
		let tree = generate(&params()).unwrap();
		let hp = Hitpattern::new(tree.num_planes(), tree.max_depth(), 0);
		let combos = default_layer_combos(tree.num_planes());
		let mut cmp = ComparePattern::new(&hp, &combos);
		tree.walk(&mut cmp);
		assert!(cmp.into_matches().is_empty());
	}
}
