//! Environment-tunable constants. None of these affect the documented
//! algorithm or the deterministic ordering contract (§5 of the design) —
//! they only adjust diagnostics and caller-facing defaults.

use once_cell::sync::Lazy;

/// Bucket-chain length in the pattern hash table at which a `trace!`
/// collision diagnostic fires.
pub static HASH_LOAD_WARN: Lazy<usize> =
	lazy_env_parse!("PATTERN_ROAD_HASH_LOAD_WARN", usize, 8);

/// Default `Hitpattern` neighbor-bin smear distance used when a caller
/// does not specify one explicitly.
pub static DEFAULT_CLUSTER_MAX_DIST: Lazy<u32> =
	lazy_env_parse!("PATTERN_ROAD_DEFAULT_CLUSTER_MAX_DIST", u32, 1);

/// Default `maxDist` tolerance for [`crate::hit::pair_iter::HitPairIter`]
/// when callers don't override it.
pub static MAX_HIT_PAIR_DIST: Lazy<u32> =
	lazy_env_parse!("PATTERN_ROAD_MAX_HIT_PAIR_DIST", u32, 3);
