//! Binary round-trip of the cyclic pattern DAG.
//!
//! First occurrence of a `Pattern` writes a new-node record and recurses;
//! a later occurrence of the same `Pattern` writes a back-reference and
//! prunes. Both encodings are implemented as a [`NodeVisitor`] — the
//! serializer is just another tree-walk consumer, same as the copy or
//! count visitors. Everything is big-endian regardless of host; no
//! integer is ever written via a host-order `memcpy`.

use byteorder::{ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::io::{Read, Write};

use super::walk::{walk_tree, NodeDescriptor, NodeVisitor, VisitResult};
use super::{BuildStats, PatternTree};
use crate::err::{Error, Result};
use crate::pattern::{Bits, Link, Pattern, PatternId, PatternNode};

const NEW_NODE_FLAG: u8 = 0x80;

/// Bytes needed to hold every value in `0..=width` — the on-disk size of
/// a pattern's bin values, chosen once per tree from its `width`
/// parameter (not hardcoded to `u16`; a narrow detector serializes to a
/// single byte per bin, as the trivial-tree worked example shows).
pub(crate) fn bin_byte_width(width: i32) -> u8 {
	let w = width.max(0) as u64;
	let bits_needed = 64 - w.leading_zeros();
	(((bits_needed as u64) + 7) / 8).max(1) as u8
}

/// Bytes needed to hold a back-reference index into a tree of
/// `total_patterns` nodes: 1, 2, or 4 bytes.
pub(crate) fn index_byte_width(total_patterns: usize) -> u8 {
	if total_patterns <= 1 << 8 {
		1
	} else if total_patterns <= 1 << 16 {
		2
	} else {
		4
	}
}

fn write_be(writer: &mut impl Write, value: u32, n_bytes: u8) -> std::io::Result<()> {
	for i in (0..n_bytes).rev() {
		writer.write_u8(((value >> (8 * i)) & 0xFF) as u8)?;
	}
	Ok(())
}

fn read_be(reader: &mut impl Read, n_bytes: u8) -> std::io::Result<u32> {
	let mut v: u32 = 0;
	for _ in 0..n_bytes {
		v = (v << 8) | reader.read_u8()? as u32;
	}
	Ok(v)
}

/// Shape information a caller must supply alongside the raw byte stream —
/// the core format carries no framing header, so the plane count, level
/// count, z-positions, configured width, and total pattern count (needed
/// to pick the back-reference index width) all come from the same
/// [`crate::params::TreeParam`] that built the tree in the first place.
#[derive(Debug, Clone)]
pub struct TreeShape {
	pub n_planes: usize,
	pub n_levels: u32,
	pub zpos: Vec<f64>,
	pub width: i32,
	pub total_patterns: usize,
}

struct Serializer<'w, W> {
	writer: &'w mut W,
	seen: HashMap<PatternId, u32>,
	bin_bytes: u8,
	index_bytes: u8,
	bytes_written: usize,
	error: Option<Error>,
}

impl<'w, W: Write> Serializer<'w, W> {
	fn try_visit(&mut self, tree: &PatternTree, nd: &NodeDescriptor) -> Result<VisitResult> {
		let pid = nd.link.child;
		if let Some(&idx) = self.seen.get(&pid) {
			self.writer.write_u8(nd.link.kind)?;
			self.bytes_written += 1;
			write_be(self.writer, idx, self.index_bytes)?;
			self.bytes_written += self.index_bytes as usize;
			return Ok(VisitResult::SkipChildren);
		}

		let idx = self.seen.len() as u32;
		self.seen.insert(pid, idx);

		self.writer.write_u8(nd.link.kind | NEW_NODE_FLAG)?;
		self.bytes_written += 1;

		let node = tree.node(pid);
		for &b in &node.pattern.bits()[1..] {
			write_be(self.writer, b as u32, self.bin_bytes)?;
			self.bytes_written += self.bin_bytes as usize;
		}

		self.writer.write_u16::<byteorder::BigEndian>(node.links().len() as u16)?;
		self.bytes_written += 2;

		Ok(VisitResult::Recurse)
	}
}

impl<'w, W: Write> NodeVisitor for Serializer<'w, W> {
	fn visit(&mut self, tree: &PatternTree, nd: &NodeDescriptor) -> VisitResult {
		match self.try_visit(tree, nd) {
			Ok(vr) => vr,
			Err(e) => {
				self.error = Some(e);
				VisitResult::Terminate
			}
		}
	}
}

/// Serializes `tree` to `writer`, returning the number of bytes written.
pub fn serialize_tree<W: Write>(tree: &PatternTree, writer: &mut W) -> Result<usize> {
	let bin_bytes = bin_byte_width(tree.width());
	let index_bytes = index_byte_width(tree.pattern_count());

	let mut ser = Serializer {
		writer,
		seen: HashMap::new(),
		bin_bytes,
		index_bytes,
		bytes_written: 0,
		error: None,
	};
	walk_tree(tree, tree.root_link(), &mut ser);

	if let Some(e) = ser.error.take() {
		return Err(e);
	}
	let bytes_written = ser.bytes_written;
	debug!(bytes_written, bin_bytes, index_bytes, "serialized pattern tree");
	Ok(bytes_written)
}

struct Deserializer<'r, R> {
	reader: &'r mut R,
	n_planes: usize,
	bin_bytes: u8,
	index_bytes: u8,
	nodes: Vec<PatternNode>,
	by_discovery: Vec<PatternId>,
}

impl<'r, R: Read> Deserializer<'r, R> {
	fn read_link(&mut self, depth: u32) -> Result<Link> {
		let tag = self.reader.read_u8()?;
		let kind = tag & !NEW_NODE_FLAG;
		let is_new = tag & NEW_NODE_FLAG != 0;

		if !is_new {
			let idx = read_be(self.reader, self.index_bytes)? as usize;
			let pid = self
				.by_discovery
				.get(idx)
				.copied()
				.ok_or_else(|| Error::FormatError(format!("back-reference index {idx} out of range")))?;
			return Ok(Link::new(pid, kind));
		}

		let mut bits = Bits::with_capacity(self.n_planes);
		bits.push(0);
		for _ in 1..self.n_planes {
			bits.push(read_be(self.reader, self.bin_bytes)? as i32);
		}
		let child_count = self.reader.read_u16::<byteorder::BigEndian>()?;

		let new_id = self.nodes.len() as PatternId;
		self.nodes.push(PatternNode::new(Pattern::new(bits), depth));
		self.by_discovery.push(new_id);

		for _ in 0..child_count {
			let link = self.read_link(depth + 1)?;
			self.nodes[new_id as usize].push_link(link);
		}

		Ok(Link::new(new_id, kind))
	}
}

/// Rebuilds a [`PatternTree`] from a byte stream produced by
/// [`serialize_tree`]. `shape` must describe the same tree that produced
/// the stream — the core format carries no self-describing header.
pub fn deserialize_tree<R: Read>(reader: &mut R, shape: &TreeShape) -> Result<PatternTree> {
	let mut de = Deserializer {
		reader,
		n_planes: shape.n_planes,
		bin_bytes: bin_byte_width(shape.width),
		index_bytes: index_byte_width(shape.total_patterns),
		nodes: Vec::with_capacity(shape.total_patterns),
		by_discovery: Vec::with_capacity(shape.total_patterns),
	};

	let root_link = de.read_link(0)?;
	if de.nodes.len() != shape.total_patterns {
		return Err(Error::FormatError(format!(
			"expected {} patterns, walk produced {}",
			shape.total_patterns,
			de.nodes.len()
		)));
	}

	let link_count = de.nodes.iter().map(|n| n.links().len()).sum();
	let stats = BuildStats {
		pattern_count: de.nodes.len(),
		link_count,
		max_depth_reached: shape.n_levels.saturating_sub(1),
	};

	debug!(pattern_count = stats.pattern_count, "deserialized pattern tree");

	Ok(PatternTree::new(
		de.nodes,
		root_link.child,
		shape.n_levels,
		shape.zpos.clone(),
		shape.width,
		stats,
	))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::params::TreeParam;
	use crate::tree::generate;

	fn shape_of(tree: &PatternTree, width: i32) -> TreeShape {
		TreeShape {
			n_planes: tree.num_planes(),
			n_levels: tree.num_levels(),
			zpos: tree.zpos().to_vec(),
			width,
			total_patterns: tree.pattern_count(),
		}
	}

	#[test]
	fn trivial_tree_serializes_to_four_bytes() {
		let params = TreeParam {
			max_depth: 1,
			width: 1,
			zpos: vec![0.0, 1.0],
			max_slope: 0.0,
		};
		let tree = generate(&params).unwrap();
		let mut buf = Vec::new();
		let n = serialize_tree(&tree, &mut buf).unwrap();
		assert_eq!(n, 4);
		assert_eq!(buf.len(), 4);
		// 0x80 (new node, link type 0), 1 bin byte, 2 child-count bytes (0).
		assert_eq!(buf, vec![0x80, 0x00, 0x00, 0x00]);
	}

	#[test]
	fn round_trip_preserves_pattern_count_and_links() {
		let params = TreeParam {
			max_depth: 4,
			width: 8,
			zpos: vec![0.0, 0.3, 0.7, 1.0],
			max_slope: 1.0,
		};
		let tree = generate(&params).unwrap();
		let mut buf = Vec::new();
		serialize_tree(&tree, &mut buf).unwrap();

		let shape = shape_of(&tree, params.width);
		let mut cursor = std::io::Cursor::new(buf);
		let restored = deserialize_tree(&mut cursor, &shape).unwrap();

		assert_eq!(restored.pattern_count(), tree.pattern_count());
		assert_eq!(restored.stats.link_count, tree.stats.link_count);
	}

	#[test]
	fn corrupt_back_reference_is_a_format_error() {
		// A single byte claiming a back-reference (high bit clear) with an
		// out-of-range index.
		let shape = TreeShape {
			n_planes: 2,
			n_levels: 2,
			zpos: vec![0.0, 1.0],
			width: 1,
			total_patterns: 1,
		};
		let mut cursor = std::io::Cursor::new(vec![0x00u8, 0xFF]);
		assert!(deserialize_tree(&mut cursor, &shape).is_err());
	}
}
