use thiserror::Error;

/// Errors produced by pattern-tree generation, (de)serialization, and
/// traversal. Road building and pattern matching never return an error —
/// a non-match simply yields an empty result (see the crate's road and
/// compare modules).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	/// Invalid generation parameters: `maxDepth` out of `[1..16]`, `width`
	/// not positive, fewer than two z-positions, z-positions not strictly
	/// increasing, or a negative `maxSlope`.
	#[error("invalid tree parameters: {0}")]
	ParamError(String),

	/// Failure writing the serialized tree to its sink.
	#[error("failed to write pattern tree: {0}")]
	IoError(#[from] std::io::Error),

	/// Deserialization saw an inconsistent tag, an unknown link type, or a
	/// back-reference index outside the range of patterns seen so far.
	#[error("corrupt pattern tree encoding: {0}")]
	FormatError(String),

	/// An internal invariant was violated. In debug builds the invariant
	/// should instead be caught by `debug_assert!` before this variant is
	/// ever constructed; this exists so a caller that downgrades a checked
	/// invariant into a `Result` has somewhere to put it.
	#[error("internal invariant violated: {0}")]
	Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
