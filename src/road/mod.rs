//! Clusters matching patterns into *roads*: maximal groups of compatible
//! patterns whose shared hits satisfy a plane-coverage criterion.

pub mod compare;

pub use compare::{default_layer_combos, ComparePattern, Match, UsedState};

use compare::bin_range;
use std::collections::HashSet as PlaneSet;

use crate::hit::HitSet;
use crate::params::Projection;
use crate::tree::PatternTree;

/// The plane-coverage tolerance: at most this many planes may be
/// unrepresented in a hit set for it to still count as a match.
pub const K_MAX_MISS: usize = 1;

/// Mutable builder that incrementally clusters [`Match`]es sharing a
/// common-hit core. Call [`RoadBuilder::add`] for every candidate in
/// discovery order, then [`RoadBuilder::finish`] once to freeze it into a
/// [`Road`] and mark each added pattern's [`UsedState`].
pub struct RoadBuilder<'m, P: Projection> {
	tree: &'m PatternTree,
	projection: &'m P,
	common_hits: HitSet,
	all_hits: HitSet,
	patterns: Vec<&'m Match>,
	left: [i64; 2],
	right: [i64; 2],
}

impl<'m, P: Projection> RoadBuilder<'m, P> {
	pub fn new(tree: &'m PatternTree, projection: &'m P) -> Self {
		Self {
			tree,
			projection,
			common_hits: HitSet::new(),
			all_hits: HitSet::new(),
			patterns: Vec::new(),
			left: [i64::MAX, i64::MAX],
			right: [0, 0],
		}
	}

	pub fn is_empty(&self) -> bool {
		self.patterns.is_empty()
	}

	pub fn common_hits(&self) -> &HitSet {
		&self.common_hits
	}

	/// `checkMatch` (§4.8): the planes contributing to `hits` must leave
	/// at most [`K_MAX_MISS`] of the projection's layers unrepresented.
	fn check_match(&self, hits: &HitSet) -> bool {
		let mut planes = PlaneSet::new();
		for hit in hits.iter() {
			planes.insert(hit.plane);
		}
		self.projection.n_layers().saturating_sub(planes.len()) <= K_MAX_MISS
	}

	fn update_bounds(&mut self, m: &Match) {
		let n_planes = self.tree.node(m.nd.link.child).pattern.len();
		let (first, _) = bin_range(self.tree, &m.nd, 0);
		let (last, _) = bin_range(self.tree, &m.nd, n_planes - 1);
		let first = first as i64;
		let last = last as i64;
		self.left[0] = self.left[0].min(first);
		self.left[1] = self.left[1].min(last);
		self.right[0] = self.right[0].max(first);
		self.right[1] = self.right[1].max(last);
	}

	/// Returns `true` iff `m` was accepted into the road. Acceptance
	/// requires the common-hit set, after intersecting with `m`'s hits,
	/// to either be unchanged or still pass [`Self::check_match`] — the
	/// common set only ever shrinks (or stays put), never grows.
	pub fn add(&mut self, m: &'m Match) -> bool {
		if self.patterns.is_empty() {
			if !self.check_match(&m.hits) {
				trace!("road rejected first candidate: checkMatch failed");
				return false;
			}
			self.common_hits = m.hits.clone();
			self.all_hits = m.hits.clone();
		} else {
			let new_common = self.common_hits.intersection(&m.hits);
			debug_assert!(
				new_common.len() <= self.common_hits.len(),
				"intersection must not grow the common-hit set"
			);
			if new_common.len() < self.common_hits.len() && !self.check_match(&new_common) {
				trace!("road rejected candidate: shrinking common set failed checkMatch");
				return false;
			}
			self.common_hits = new_common;
			self.all_hits = self.all_hits.union(&m.hits);
		}

		self.patterns.push(m);
		self.update_bounds(m);
		trace!(pattern_count = self.patterns.len(), "road accepted candidate");
		true
	}

	/// Marks every added pattern's [`UsedState`] and freezes the road.
	/// Idempotent in the sense that an empty builder simply freezes into
	/// an empty road — callers are expected to have already checked
	/// `is_empty()` before bothering to call this.
	pub fn finish(self) -> Road<'m> {
		for m in &self.patterns {
			let not_common = m.hits.difference(&self.common_hits);
			let used = if not_common.is_empty() {
				UsedState::Full
			} else {
				UsedState::Partial
			};
			m.used.set(used);
		}
		Road {
			common_hits: self.common_hits,
			all_hits: self.all_hits,
			patterns: self.patterns,
			left: self.left,
			right: self.right,
		}
	}
}

/// A frozen, immutable cluster of matching patterns: one candidate track
/// in one projection.
#[derive(Debug)]
pub struct Road<'m> {
	pub common_hits: HitSet,
	pub all_hits: HitSet,
	pub patterns: Vec<&'m Match>,
	/// `[first-plane, last-plane]` minimum bin covered across `patterns`.
	pub left: [i64; 2],
	/// `[first-plane, last-plane]` maximum bin covered across `patterns`.
	pub right: [i64; 2],
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::hit::{Hit, Hitpattern, PlaneRef};
	use crate::params::TreeParam;
	use crate::tree::generate;

	struct FakeProjection {
		n_layers: usize,
		n_planes: usize,
		hitpattern: Hitpattern,
	}

	impl Projection for FakeProjection {
		fn n_layers(&self) -> usize {
			self.n_layers
		}
		fn n_planes(&self) -> usize {
			self.n_planes
		}
		fn hitpattern(&self) -> &Hitpattern {
			&self.hitpattern
		}
	}

	fn three_plane_tree() -> crate::tree::PatternTree {
		generate(&TreeParam {
			max_depth: 3,
			width: 4,
			zpos: vec![0.0, 0.5, 1.0],
			max_slope: 2.0,
		})
		.unwrap()
	}

	fn hit_at(plane: u16, wire: u32) -> Hit {
		Hit::new(PlaneRef::new(0, plane), wire, wire as f64, 0.5, 0.0)
	}

	#[test]
	fn road_shrinks_common_hits_and_rejects_incompatible_pattern() {
		let tree = three_plane_tree();
		let mut hp = Hitpattern::new(3, tree.max_depth(), 0);
		hp.set_hit(0, 0, hit_at(0, 0));
		hp.set_hit(1, 0, hit_at(1, 0));
		hp.set_hit(2, 0, hit_at(2, 0));
		let projection = FakeProjection {
			n_layers: 3,
			n_planes: 3,
			hitpattern: hp,
		};

		let combos = default_layer_combos(3);
		let mut cmp = ComparePattern::new(&projection.hitpattern, &combos);
		tree.walk(&mut cmp);
		let matches = cmp.into_matches();
		assert!(!matches.is_empty());

		let mut builder = RoadBuilder::new(&tree, &projection);
		for m in &matches {
			builder.add(m);
		}
		assert!(!builder.is_empty());
		let road = builder.finish();
		assert!(road.patterns.iter().all(|m| !matches!(m.used.get(), UsedState::NotConsumed)));
	}
}
