//! Core types and collaborator traits for the Sievert transport kernel.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Sievert workspace:
//! typed IDs, the particle state and bank, the particle mode table,
//! per-history random streams, error types, and the collaborator traits
//! (geometry, collision physics, source, tally observers) that the
//! transport loop is written against.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bank;
pub mod error;
pub mod id;
pub mod mode;
pub mod particle;
pub mod rng;
pub mod traits;

pub use bank::ParticleBank;
pub use error::NavigationError;
pub use id::{CellId, HistoryId, SurfaceId};
pub use mode::{ModeError, ParticleMode};
pub use particle::{Fate, ParticleState, ParticleType, TerminationReason};
pub use rng::HistoryRng;
pub use traits::{CollisionKernel, Crossing, EventObserver, Navigator, ParticleSource, RayHit};

pub use rand::RngCore;
