//! Deduplicating dictionary keyed on a [`Pattern`]'s bit content.
//!
//! Bucket insertion is always head-first (the most recently inserted node
//! in a bucket is found first), and the bucket count is fixed at
//! construction time. Both are part of the generator's deterministic
//! output contract: the same parameters must always produce the same
//! bucket chain order, and therefore the same serialized file.

use ahash::AHasher;
use std::hash::{Hash, Hasher};

use super::{Bits, PatternId};
use crate::cnf;

/// A bucket-chain entry: the exact bits it was inserted with (so lookups
/// never need to dereference back into the pattern arena), the
/// `PatternId` it names, and the link to the next (older) node sharing
/// this bucket.
#[derive(Debug, Clone)]
struct HashNode {
	bits: Bits,
	pattern: PatternId,
	next: Option<u32>,
}

pub struct HashTable {
	buckets: Vec<Option<u32>>,
	nodes: Vec<HashNode>,
}

impl HashTable {
	/// Bucket count is fixed at `2^(n_levels - 1)` on first construction,
	/// per the generator's sizing rule.
	pub fn with_levels(n_levels: u32) -> Self {
		let size = 1usize << n_levels.saturating_sub(1).max(1);
		Self {
			buckets: vec![None; size.max(1)],
			nodes: Vec::new(),
		}
	}

	fn bucket_of(&self, bits: &[i32]) -> usize {
		let mut hasher = AHasher::default();
		bits.hash(&mut hasher);
		(hasher.finish() as usize) % self.buckets.len()
	}

	/// Finds the entry whose bit content matches `bits` exactly, returning
	/// its `PatternId`.
	pub fn find(&self, bits: &[i32]) -> Option<PatternId> {
		let bucket = self.bucket_of(bits);
		let mut chain_len = 0usize;
		let mut cursor = self.buckets[bucket];
		while let Some(idx) = cursor {
			chain_len += 1;
			let node = &self.nodes[idx as usize];
			if node.bits.as_slice() == bits {
				if chain_len >= *cnf::HASH_LOAD_WARN {
					trace!(chain_len, "hash bucket chain walk exceeded warn threshold");
				}
				return Some(node.pattern);
			}
			cursor = node.next;
		}
		None
	}

	/// Inserts a new mapping. Caller must have already verified `bits` is
	/// not already present (see [`find`]).
	pub fn insert(&mut self, bits: Bits, pattern: PatternId) {
		let bucket = self.bucket_of(&bits);
		let idx = self.nodes.len() as u32;
		self.nodes.push(HashNode {
			bits,
			pattern,
			next: self.buckets[bucket],
		});
		self.buckets[bucket] = Some(idx);
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::pattern::Bits;

	#[test]
	fn insert_then_find_round_trips() {
		let mut table = HashTable::with_levels(4);
		table.insert(Bits::from_vec(vec![0, 1]), 0);
		table.insert(Bits::from_vec(vec![0, 2]), 1);
		assert_eq!(table.find(&[0, 1]), Some(0));
		assert_eq!(table.find(&[0, 2]), Some(1));
		assert_eq!(table.find(&[0, 3]), None);
	}

	#[test]
	fn head_insert_finds_newest_first_on_collision() {
		// Force a collision by using a table with a single bucket.
		let mut table = HashTable::with_levels(1);
		table.insert(Bits::from_vec(vec![0, 1]), 0);
		table.insert(Bits::from_vec(vec![0, 2]), 1);
		// Both share bucket 0; the chain should still resolve distinct keys
		// correctly regardless of insertion order.
		assert_eq!(table.find(&[0, 1]), Some(0));
		assert_eq!(table.find(&[0, 2]), Some(1));
	}
}
