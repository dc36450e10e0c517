//! [`Pattern`] is the depth-independent bit tuple shared by every node in
//! the pattern DAG, plus the [`Link`]s that reference its children.

pub mod child_iter;
pub mod hash_table;

pub use child_iter::ChildIter;
pub use hash_table::HashTable;

use smallvec::SmallVec;

/// Index of a [`Pattern`] inside a [`crate::tree::PatternTree`]'s arena.
pub type PatternId = u32;

/// `type & 1` = the referencing parent must shift the child right by one
/// bit to obtain the effective instance. `type & 2` = the parent must
/// mirror the child across its width. The two never occur together.
pub type LinkType = u8;

pub const LINK_NONE: LinkType = 0;
pub const LINK_SHIFT: LinkType = 1;
pub const LINK_MIRROR: LinkType = 2;

/// A typed reference from a parent [`Pattern`] to a child [`Pattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
	pub child: PatternId,
	pub kind: LinkType,
}

impl Link {
	pub fn new(child: PatternId, kind: LinkType) -> Self {
		debug_assert!(kind & LINK_SHIFT != 0 || kind & LINK_MIRROR != 0 || kind == LINK_NONE);
		debug_assert!(
			kind != (LINK_SHIFT | LINK_MIRROR),
			"simultaneous shift+mirror does not occur"
		);
		Self {
			child,
			kind,
		}
	}
}

/// The maximum number of detector planes a pattern's bits are stored
/// inline for before spilling to the heap. Real wire chambers rarely
/// exceed a handful of tracking planes per projection.
const INLINE_PLANES: usize = 8;

pub type Bits = SmallVec<[i32; INLINE_PLANES]>;

/// An ordered N-tuple of bin indices, one per detector plane, with
/// `bits[0] == 0` (normalization) and `width() >= 0` (canonical form).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
	bits: Bits,
}

impl Pattern {
	pub fn new(bits: Bits) -> Self {
		debug_assert_eq!(bits.first().copied(), Some(0), "bits[0] must be 0");
		Self {
			bits,
		}
	}

	pub fn root(n_planes: usize) -> Self {
		Self::new(Bits::from_elem(0, n_planes))
	}

	pub fn bits(&self) -> &[i32] {
		&self.bits
	}

	pub fn len(&self) -> usize {
		self.bits.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bits.is_empty()
	}

	/// `max(bits) - min(bits)`. Always `>= 0` for a stored, canonical
	/// pattern.
	pub fn width(&self) -> i32 {
		let min = self.bits.iter().copied().min().unwrap_or(0);
		let max = self.bits.iter().copied().max().unwrap_or(0);
		max - min
	}

	pub fn is_canonical(&self) -> bool {
		self.bits.first().copied() == Some(0) && self.width() >= 0
	}
}

/// Arena-stored node: a [`Pattern`] plus its outgoing [`Link`]s, kept in
/// discovery order (the order `ChildIter` produced them in), matching the
/// deterministic traversal contract in the design's concurrency section.
#[derive(Debug, Clone)]
pub struct PatternNode {
	pub pattern: Pattern,
	/// Shallowest depth at which this node has been validated as usable.
	pub min_depth: u32,
	links: Vec<Link>,
}

impl PatternNode {
	pub fn new(pattern: Pattern, min_depth: u32) -> Self {
		Self {
			pattern,
			min_depth,
			links: Vec::new(),
		}
	}

	pub fn links(&self) -> &[Link] {
		&self.links
	}

	pub fn has_children(&self) -> bool {
		!self.links.is_empty()
	}

	/// Links are appended in discovery order; [`links`] walks them in that
	/// same order, which is the order the serializer depends on.
	pub(crate) fn push_link(&mut self, link: Link) {
		self.links.push(link);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn root_pattern_is_canonical() {
		let p = Pattern::root(4);
		assert_eq!(p.bits(), &[0, 0, 0, 0]);
		assert_eq!(p.width(), 0);
		assert!(p.is_canonical());
	}

	#[test]
	fn width_is_span_of_bits() {
		let p = Pattern::new(Bits::from_vec(vec![0, 3, 1]));
		assert_eq!(p.width(), 3);
	}
}
