//! Error types for geometry navigation.
//!
//! Navigation failures are *expected* outcomes on the transport hot
//! path: they mark a single particle as lost rather than aborting the
//! run. Fatal configuration and protocol errors live in the crates that
//! own them (`sievert-transport`, `sievert-batch`).

use std::error::Error;
use std::fmt;

/// A geometry navigation failure.
///
/// Returned by [`Navigator`](crate::traits::Navigator) operations and
/// stored in [`Fate::Lost`](crate::particle::Fate::Lost) when a particle
/// cannot be traced any further. Carries a human-readable reason from
/// the geometry engine for the lost-particle diagnostic dump.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationError {
    /// A ray could not be traced from the particle's current state.
    RayTraceFailed {
        /// Description of the failure from the geometry engine.
        reason: String,
    },
    /// No cell contains the queried point.
    PointNotInModel {
        /// Description of the failure from the geometry engine.
        reason: String,
    },
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RayTraceFailed { reason } => write!(f, "ray trace failed: {reason}"),
            Self::PointNotInModel { reason } => write!(f, "point not in model: {reason}"),
        }
    }
}

impl Error for NavigationError {}
