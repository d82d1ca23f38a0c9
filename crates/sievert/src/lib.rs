//! Sievert: a Monte Carlo particle transport toolkit.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Sievert sub-crates. For most users, adding `sievert` as a
//! single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use sievert::prelude::*;
//! use std::sync::Arc;
//!
//! // A one-cell model: cell 0 spans x < 1, everything beyond the
//! // plane at x = 1 is the graveyard (cell 1).
//! struct Slab;
//! impl Navigator for Slab {
//!     fn fire_ray(&self, p: &ParticleState) -> Result<RayHit, NavigationError> {
//!         Ok(RayHit { distance: 1.0 - p.position[0], surface: SurfaceId(0) })
//!     }
//!     fn find_cell_containing(
//!         &self,
//!         _position: [f64; 3],
//!         _direction: [f64; 3],
//!     ) -> Result<CellId, NavigationError> {
//!         Ok(CellId(0))
//!     }
//!     fn advance_to_boundary(
//!         &self,
//!         p: &mut ParticleState,
//!         hit: &RayHit,
//!     ) -> Result<Crossing, NavigationError> {
//!         p.advance(hit.distance);
//!         p.cell = Some(CellId(1));
//!         Ok(Crossing { cell: CellId(1), reflected: false })
//!     }
//!     fn is_termination_cell(&self, cell: CellId) -> bool {
//!         cell == CellId(1)
//!     }
//! }
//!
//! // No material anywhere: particles stream to the boundary.
//! struct Vacuum;
//! impl CollisionKernel for Vacuum {
//!     fn sample_optical_path_length(&self, _rng: &mut dyn RngCore) -> f64 {
//!         f64::INFINITY
//!     }
//!     fn macroscopic_total_cross_section(&self, _p: &ParticleState) -> f64 {
//!         0.0
//!     }
//!     fn collide(
//!         &self,
//!         _p: &mut ParticleState,
//!         _bank: &mut ParticleBank,
//!         _survival_biasing: bool,
//!         _rng: &mut dyn RngCore,
//!     ) {
//!     }
//! }
//!
//! // One photon per history, fired along +x from the origin.
//! struct Beam;
//! impl ParticleSource for Beam {
//!     fn sample_particle_state(
//!         &self,
//!         bank: &mut ParticleBank,
//!         history: HistoryId,
//!         _rng: &mut dyn RngCore,
//!     ) {
//!         let mut p = ParticleState::new(ParticleType::Photon, history);
//!         p.direction = [1.0, 0.0, 0.0];
//!         bank.push(p);
//!     }
//! }
//!
//! struct NoTallies;
//! impl EventObserver for NoTallies {}
//!
//! let properties = SimulationProperties::new(ParticleMode::Photon, 10);
//! let manager = TransportManager::new(
//!     properties,
//!     Arc::new(Slab),
//!     Arc::new(Vacuum),
//!     Arc::new(Beam),
//!     Arc::new(NoTallies),
//! )
//! .unwrap();
//! manager.run_simulation().unwrap();
//! assert_eq!(manager.histories_completed(), 10);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `sievert-core` | IDs, particle state, bank, modes, collaborator traits |
//! | [`transport`] | `sievert-transport` | The transport manager and per-history loop |
//! | [`batch`] | `sievert-batch` | Distributed batch coordination |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and collaborator traits (`sievert-core`).
///
/// Contains the particle state, bank, typed IDs, particle modes,
/// per-history random streams, and the traits
/// ([`types::Navigator`], [`types::CollisionKernel`],
/// [`types::ParticleSource`], [`types::EventObserver`]) the transport
/// loop is written against.
pub use sievert_core as types;

/// Single-node transport (`sievert-transport`).
///
/// [`transport::TransportManager`] runs histories from birth to
/// termination across a thread pool.
pub use sievert_transport as transport;

/// Distributed batch coordination (`sievert-batch`).
///
/// Partition a run into batches with [`batch::BatchPlan`] and
/// distribute them dynamically with [`batch::run_distributed`].
pub use sievert_batch as batch;

/// Common imports for typical Sievert usage.
///
/// ```rust
/// use sievert::prelude::*;
/// ```
///
/// This imports the particle and bank types, the collaborator traits,
/// the transport manager, and the distributed-run entry points.
pub mod prelude {
    // Particle state and bank
    pub use sievert_core::{
        CellId, Fate, HistoryId, ParticleBank, ParticleState, ParticleType, SurfaceId,
        TerminationReason,
    };

    // Modes and random streams
    pub use sievert_core::{HistoryRng, ParticleMode, RngCore};

    // Collaborator traits
    pub use sievert_core::{
        CollisionKernel, Crossing, EventObserver, NavigationError, Navigator, ParticleSource,
        RayHit,
    };

    // Transport
    pub use sievert_transport::{
        ControlCommand, ControlOutcome, SimulationProperties, TransportManager,
    };

    // Distributed runs
    pub use sievert_batch::{run_distributed, BatchPlan, ChannelComm, Communicator, Rank};
}
