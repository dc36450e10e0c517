//! Generation-time parameters and the contract a caller's detector
//! projection must satisfy to build a [`crate::road::Road`].

use crate::err::Error;

/// Parameters to [`crate::tree::generate`]: `maxDepth ∈ [1..16]`,
/// `width > 0`, `zpos` strictly increasing over at least two entries, and
/// `maxSlope >= 0`.
#[derive(Debug, Clone)]
pub struct TreeParam {
	pub max_depth: u32,
	pub width: i32,
	pub zpos: Vec<f64>,
	pub max_slope: f64,
}

impl TreeParam {
	pub fn validate(&self) -> Result<(), Error> {
		if !(1..=16).contains(&self.max_depth) {
			return Err(Error::ParamError(format!(
				"maxDepth must be in [1, 16], got {}",
				self.max_depth
			)));
		}
		if self.width <= 0 {
			return Err(Error::ParamError(format!("width must be > 0, got {}", self.width)));
		}
		if self.zpos.len() < 2 {
			return Err(Error::ParamError(format!(
				"zpos must have at least 2 entries, got {}",
				self.zpos.len()
			)));
		}
		if !self.zpos.windows(2).all(|w| w[0] < w[1]) {
			return Err(Error::ParamError("zpos must be strictly increasing".into()));
		}
		if self.max_slope < 0.0 {
			return Err(Error::ParamError(format!(
				"maxSlope must be >= 0, got {}",
				self.max_slope
			)));
		}
		Ok(())
	}

	/// Maps `zpos` linearly onto `[0, 1]`.
	pub(crate) fn normalized_zpos(&self) -> Vec<f64> {
		let lo = self.zpos[0];
		let hi = *self.zpos.last().unwrap();
		let span = hi - lo;
		self.zpos.iter().map(|z| (z - lo) / span).collect()
	}
}

/// What a detector projection must provide to build a [`crate::road::Road`]
/// from matched patterns: the layer count used by the plane-coverage test,
/// the total plane count (`nPlanes >= nLayers`), and the event's
/// [`crate::hit::Hitpattern`].
pub trait Projection {
	fn n_layers(&self) -> usize;
	fn n_planes(&self) -> usize;
	fn hitpattern(&self) -> &crate::hit::Hitpattern;
}
