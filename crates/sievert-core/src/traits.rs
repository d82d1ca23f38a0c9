//! Collaborator traits the transport loop is written against.
//!
//! The geometry engine, collision physics, source sampler, and tally
//! system are external collaborators: the kernel consumes these
//! contracts and implements none of them. All collaborators are shared
//! immutably across worker threads, so every method takes `&self`;
//! implementations own whatever interior synchronization they need.

use rand::RngCore;

use crate::bank::ParticleBank;
use crate::error::NavigationError;
use crate::id::{CellId, SurfaceId};
use crate::particle::ParticleState;

/// Result of firing a ray from a particle's current position along its
/// direction of flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Geometric distance to the next bounding surface.
    pub distance: f64,
    /// The surface that will be hit.
    pub surface: SurfaceId,
}

/// Result of advancing a particle through a cell boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Crossing {
    /// The cell on the far side of the surface.
    pub cell: CellId,
    /// Whether the surface reflected the particle. Reflection updates
    /// the particle's direction in place.
    pub reflected: bool,
}

/// Ray-firing, cell-containment, and boundary-crossing primitives.
///
/// Navigation failures are recoverable per particle: the caller marks
/// the particle lost and continues with siblings and other histories.
pub trait Navigator: Send + Sync {
    /// Distance from the particle's position to the next surface along
    /// its direction of flight.
    fn fire_ray(&self, particle: &ParticleState) -> Result<RayHit, NavigationError>;

    /// The cell containing `position` for a particle traveling along
    /// `direction` (the direction disambiguates points exactly on a
    /// boundary).
    fn find_cell_containing(
        &self,
        position: [f64; 3],
        direction: [f64; 3],
    ) -> Result<CellId, NavigationError>;

    /// Move the particle through the surface reported by `hit`,
    /// updating its position and cell (and direction, on reflection).
    fn advance_to_boundary(
        &self,
        particle: &mut ParticleState,
        hit: &RayHit,
    ) -> Result<Crossing, NavigationError>;

    /// Whether `cell` is a termination (graveyard) region whose entry
    /// marks a particle as permanently gone.
    fn is_termination_cell(&self, cell: CellId) -> bool;
}

/// Optical-path sampling, cross-section lookup, and collision
/// resolution.
pub trait CollisionKernel: Send + Sync {
    /// Sample the number of mean free paths the next track leg covers.
    ///
    /// A pure random draw; no side effect beyond advancing `rng`.
    fn sample_optical_path_length(&self, rng: &mut dyn RngCore) -> f64;

    /// Macroscopic total cross section for the particle's current cell
    /// and energy. Zero if the cell is void for this particle type.
    fn macroscopic_total_cross_section(&self, particle: &ParticleState) -> f64;

    /// Resolve a collision at the particle's current position.
    ///
    /// May mutate the particle's energy, direction, and weight, and may
    /// push secondaries onto `bank`. With `survival_biasing` the
    /// particle's weight is reduced instead of killing it
    /// probabilistically.
    fn collide(
        &self,
        particle: &mut ParticleState,
        bank: &mut ParticleBank,
        survival_biasing: bool,
        rng: &mut dyn RngCore,
    );
}

/// Initial particle-state sampling.
pub trait ParticleSource: Send + Sync {
    /// Push zero or more generation-0 states tagged with `history`
    /// onto `bank`.
    fn sample_particle_state(
        &self,
        bank: &mut ParticleBank,
        history: crate::id::HistoryId,
        rng: &mut dyn RngCore,
    );
}

/// Event-driven tally updates.
///
/// Every method must be safe to call from any worker thread for its
/// own history; pending per-history deltas are folded into shared
/// accumulators only by
/// [`commit_history_contributions`](EventObserver::commit_history_contributions),
/// called once per completed history. All methods default to no-ops so
/// observers implement only the events they tally.
#[allow(unused_variables)]
pub trait EventObserver: Send + Sync {
    /// The particle entered `cell`.
    fn entering_cell(&self, particle: &ParticleState, cell: CellId) {}

    /// The particle left `cell`.
    fn leaving_cell(&self, particle: &ParticleState, cell: CellId) {}

    /// The particle crossed `surface`. Fired a second time when the
    /// surface reflects the particle, after the direction update.
    fn crossing_surface(&self, particle: &ParticleState, surface: SurfaceId) {}

    /// A subtrack of length `track_length` ended inside `cell`.
    fn subtrack_ending_in_cell(
        &self,
        particle: &ParticleState,
        cell: CellId,
        track_length: f64,
        start_time: f64,
    ) {}

    /// The particle collided in its current cell. `inverse_cross_section`
    /// is the collision estimator weight factor `1 / sigma_t`.
    fn colliding_in_cell(&self, particle: &ParticleState, inverse_cross_section: f64) {}

    /// A track leg ended anywhere in the model (mesh/global tallies).
    fn subtrack_ending_global(&self, particle: &ParticleState, start: [f64; 3], end: [f64; 3]) {}

    /// Fold this history's pending tally deltas into the shared
    /// accumulators.
    fn commit_history_contributions(&self) {}

    /// The run is about to start.
    fn simulation_started(&self) {}

    /// The run has stopped.
    fn simulation_stopped(&self) {}
}
