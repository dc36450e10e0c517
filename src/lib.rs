//! Reconstructs straight-line tracks across a layered wire-chamber
//! detector by matching an event's hits against a precomputed tree of
//! every bit pattern a bounded-slope line can produce.
//!
//! [`tree::generate`] builds the [`tree::PatternTree`] once, offline, from
//! a [`params::TreeParam`]. At event time, [`road::ComparePattern`] walks
//! that tree against a [`hit::Hitpattern`] to collect [`road::Match`]es,
//! which [`road::RoadBuilder`] clusters into [`road::Road`]s.

#[macro_use]
extern crate tracing;

#[macro_use]
mod mac;

pub mod cnf;
pub mod err;
pub mod geom;
pub mod hit;
pub mod params;
pub mod pattern;
pub mod road;
pub mod tree;

pub use err::{Error, Result};
pub use params::{Projection, TreeParam};
pub use tree::{generate, PatternTree};
