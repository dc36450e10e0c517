//! A detected ionization ([`Hit`]) on a wire plane, the [`HitSet`] it is
//! clustered into, and the proximity-aware [`HitPairIter`] used to pair
//! hits across two companion planes.

pub mod hitpattern;
pub mod pair_iter;

pub use hitpattern::Hitpattern;
pub use pair_iter::{HitPairIter, Pair};

use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Identifies a detector plane. `plane_type` groups planes that measure
/// the same coordinate (a projection); `plane_index` orders planes within
/// a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlaneRef {
	pub plane_type: u16,
	pub plane_index: u16,
}

impl PlaneRef {
	pub fn new(plane_type: u16, plane_index: u16) -> Self {
		Self {
			plane_type,
			plane_index,
		}
	}
}

/// A detected ionization on a specific wire plane.
#[derive(Debug, Clone, Copy)]
pub struct Hit {
	pub plane: PlaneRef,
	pub wire: u32,
	/// The primary wire position used for binning.
	pub position: f64,
	pub resolution: f64,
	pub drift_time: f64,
	/// The left/right ambiguous drift-distance positions (the physical
	/// wire can't distinguish which side of itself the track passed).
	pub left: f64,
	pub right: f64,
}

impl Hit {
	pub fn new(plane: PlaneRef, wire: u32, position: f64, resolution: f64, drift_time: f64) -> Self {
		Self {
			plane,
			wire,
			position,
			resolution,
			drift_time,
			left: position - resolution,
			right: position + resolution,
		}
	}

	/// The non-float prefix of the ordering. `drift_time` is compared
	/// separately via `total_cmp`, since raw IEEE-754 bit patterns (`to_bits`)
	/// don't order the same as the values they represent for negative or
	/// NaN inputs.
	fn sort_key(&self) -> (u16, u16, u32) {
		(self.plane.plane_type, self.plane.plane_index, self.wire)
	}
}

impl PartialEq for Hit {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}
impl Eq for Hit {}

impl PartialOrd for Hit {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Hit {
	/// Lexicographic on `(planeType, planeIndex, wireNumber, driftTime)`.
	/// `driftTime` uses `total_cmp` for a well-defined total order across
	/// negative values and NaN, rather than comparing raw bit patterns.
	fn cmp(&self, other: &Self) -> Ordering {
		self.sort_key()
			.cmp(&other.sort_key())
			.then_with(|| self.drift_time.total_cmp(&other.drift_time))
	}
}

/// Treats two hits as equivalent for clustering purposes when they are
/// within `max_dist` wires of each other on the same plane.
pub fn wire_dist_cmp(a: &Hit, b: &Hit, max_dist: u32) -> Ordering {
	if a.plane != b.plane {
		return a.plane.cmp(&b.plane);
	}
	let diff = a.wire as i64 - b.wire as i64;
	if diff.unsigned_abs() <= max_dist as u64 {
		Ordering::Equal
	} else {
		a.wire.cmp(&b.wire)
	}
}

/// A set of [`Hit`]s with a total order consistent with [`Hit::cmp`]. Used
/// as map keys and for intersection/union/difference during road
/// building.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitSet(BTreeSet<Hit>);

impl HitSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_iter(hits: impl IntoIterator<Item = Hit>) -> Self {
		Self(hits.into_iter().collect())
	}

	pub fn insert(&mut self, hit: Hit) -> bool {
		self.0.insert(hit)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Hit> {
		self.0.iter()
	}

	pub fn contains_plane(&self, plane: PlaneRef) -> bool {
		self.0.iter().any(|h| h.plane == plane)
	}

	pub fn intersection(&self, other: &Self) -> Self {
		Self(self.0.intersection(&other.0).copied().collect())
	}

	pub fn union(&self, other: &Self) -> Self {
		Self(self.0.union(&other.0).copied().collect())
	}

	pub fn difference(&self, other: &Self) -> Self {
		Self(self.0.difference(&other.0).copied().collect())
	}
}
