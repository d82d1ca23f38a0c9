//! Mock collaborators and fixtures for Sievert development.
//!
//! Provides deterministic implementations of the collaborator traits
//! ([`Navigator`], [`CollisionKernel`], [`ParticleSource`],
//! [`EventObserver`]) so the transport loop and batch coordinator can be
//! tested without a geometry engine or physics library.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use rand::{Rng, RngCore};

use sievert_core::{
    CellId, CollisionKernel, Crossing, EventObserver, HistoryId, NavigationError, Navigator,
    ParticleBank, ParticleSource, ParticleState, ParticleType, RayHit, SurfaceId,
};

// ── SlabNavigator ───────────────────────────────────────────────

/// A 1-D slab geometry along the x axis.
///
/// `boundaries` are strictly increasing plane coordinates; cell `i`
/// spans `[boundaries[i], boundaries[i + 1])`. Crossing past either end
/// of the stack enters the graveyard cell [`SlabNavigator::GRAVEYARD`],
/// unless `reflect_left` is set, in which case the leftmost plane
/// reflects the particle back into cell 0.
///
/// Rays parallel to the slab planes (zero x direction component) cannot
/// be traced and are reported as navigation failures.
pub struct SlabNavigator {
    boundaries: Vec<f64>,
    reflect_left: bool,
}

impl SlabNavigator {
    /// Cell entered when a particle leaves the slab stack.
    pub const GRAVEYARD: CellId = CellId(u64::MAX);

    pub fn new(boundaries: Vec<f64>) -> Self {
        assert!(boundaries.len() >= 2, "need at least one cell");
        assert!(
            boundaries.windows(2).all(|w| w[0] < w[1]),
            "boundaries must be strictly increasing"
        );
        Self {
            boundaries,
            reflect_left: false,
        }
    }

    pub fn with_reflecting_left_plane(mut self) -> Self {
        self.reflect_left = true;
        self
    }

    fn cell_count(&self) -> u64 {
        (self.boundaries.len() - 1) as u64
    }

    fn interior_cell(&self, particle: &ParticleState) -> Result<usize, NavigationError> {
        match particle.cell {
            Some(cell) if cell.0 < self.cell_count() => Ok(cell.0 as usize),
            Some(cell) => Err(NavigationError::RayTraceFailed {
                reason: format!("cell {cell} is not an interior slab cell"),
            }),
            None => Err(NavigationError::RayTraceFailed {
                reason: "particle has no cell".to_string(),
            }),
        }
    }
}

impl Navigator for SlabNavigator {
    fn fire_ray(&self, particle: &ParticleState) -> Result<RayHit, NavigationError> {
        let cell = self.interior_cell(particle)?;
        let x = particle.position[0];
        let u = particle.direction[0];
        if u == 0.0 {
            return Err(NavigationError::RayTraceFailed {
                reason: "ray is parallel to the slab planes".to_string(),
            });
        }
        let (plane, surface) = if u > 0.0 {
            (self.boundaries[cell + 1], SurfaceId((cell + 1) as u64))
        } else {
            (self.boundaries[cell], SurfaceId(cell as u64))
        };
        Ok(RayHit {
            distance: (plane - x) / u,
            surface,
        })
    }

    fn find_cell_containing(
        &self,
        position: [f64; 3],
        _direction: [f64; 3],
    ) -> Result<CellId, NavigationError> {
        let x = position[0];
        let first = self.boundaries[0];
        let last = *self.boundaries.last().unwrap_or(&first);
        if x < first || x >= last {
            return Err(NavigationError::PointNotInModel {
                reason: format!("x = {x} lies outside [{first}, {last})"),
            });
        }
        let cell = self.boundaries.partition_point(|&b| b <= x) - 1;
        Ok(CellId(cell as u64))
    }

    fn advance_to_boundary(
        &self,
        particle: &mut ParticleState,
        hit: &RayHit,
    ) -> Result<Crossing, NavigationError> {
        let cell = self.interior_cell(particle)?;
        particle.advance(hit.distance);

        let moving_right = particle.direction[0] > 0.0;
        let crossing = if moving_right {
            if cell + 1 < self.cell_count() as usize {
                Crossing {
                    cell: CellId((cell + 1) as u64),
                    reflected: false,
                }
            } else {
                Crossing {
                    cell: Self::GRAVEYARD,
                    reflected: false,
                }
            }
        } else if cell > 0 {
            Crossing {
                cell: CellId((cell - 1) as u64),
                reflected: false,
            }
        } else if self.reflect_left {
            particle.direction[0] = -particle.direction[0];
            Crossing {
                cell: CellId(0),
                reflected: true,
            }
        } else {
            Crossing {
                cell: Self::GRAVEYARD,
                reflected: false,
            }
        };
        particle.cell = Some(crossing.cell);
        Ok(crossing)
    }

    fn is_termination_cell(&self, cell: CellId) -> bool {
        cell == Self::GRAVEYARD
    }
}

// ── FailingNavigator ────────────────────────────────────────────

/// A navigator whose rays always fail, for lost-particle tests.
///
/// `find_cell_containing` succeeds (cell 0) unless `fail_location` is
/// set, so the failure can be staged either at birth or at the first
/// ray trace. Counts calls so tests can assert the kernel stops
/// touching a lost particle.
#[derive(Default)]
pub struct FailingNavigator {
    pub fail_location: bool,
    pub fire_ray_calls: AtomicU64,
    pub find_cell_calls: AtomicU64,
}

impl FailingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_location() -> Self {
        Self {
            fail_location: true,
            ..Self::default()
        }
    }
}

impl Navigator for FailingNavigator {
    fn fire_ray(&self, _particle: &ParticleState) -> Result<RayHit, NavigationError> {
        self.fire_ray_calls.fetch_add(1, Ordering::Relaxed);
        Err(NavigationError::RayTraceFailed {
            reason: "mock navigator always fails".to_string(),
        })
    }

    fn find_cell_containing(
        &self,
        _position: [f64; 3],
        _direction: [f64; 3],
    ) -> Result<CellId, NavigationError> {
        self.find_cell_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_location {
            Err(NavigationError::PointNotInModel {
                reason: "mock navigator has no cells".to_string(),
            })
        } else {
            Ok(CellId(0))
        }
    }

    fn advance_to_boundary(
        &self,
        _particle: &mut ParticleState,
        _hit: &RayHit,
    ) -> Result<Crossing, NavigationError> {
        Err(NavigationError::RayTraceFailed {
            reason: "mock navigator always fails".to_string(),
        })
    }

    fn is_termination_cell(&self, _cell: CellId) -> bool {
        false
    }
}

// ── MockCollision ───────────────────────────────────────────────

/// What [`MockCollision::collide`] does to the colliding particle.
#[derive(Clone, Copy, Debug)]
pub enum CollideBehavior {
    /// Set the particle's energy to zero (absorbed; falls below any
    /// positive cutoff).
    Absorb,
    /// Multiply the particle's energy by the factor.
    LoseEnergy(f64),
    /// Multiply the survivor's energy by the factor and bank that many
    /// secondaries of the same type at the collision site.
    Split {
        energy_factor: f64,
        secondaries: usize,
    },
}

/// Scriptable collision kernel with per-cell cross sections.
///
/// Cells without an entry in `cross_sections` are void (zero cross
/// section). A fixed `optical_path` makes collision sites exactly
/// predictable; `None` draws from the standard exponential.
pub struct MockCollision {
    cross_sections: HashMap<CellId, f64>,
    optical_path: Option<f64>,
    behavior: CollideBehavior,
    pub sample_calls: AtomicU64,
    pub collide_calls: AtomicU64,
}

impl MockCollision {
    pub fn new(behavior: CollideBehavior) -> Self {
        Self {
            cross_sections: HashMap::new(),
            optical_path: None,
            behavior,
            sample_calls: AtomicU64::new(0),
            collide_calls: AtomicU64::new(0),
        }
    }

    /// Void everywhere, never collides: streaming-only transport.
    pub fn vacuum() -> Self {
        Self::new(CollideBehavior::Absorb)
    }

    pub fn with_cross_section(mut self, cell: CellId, sigma_t: f64) -> Self {
        self.cross_sections.insert(cell, sigma_t);
        self
    }

    pub fn with_fixed_optical_path(mut self, optical_path: f64) -> Self {
        self.optical_path = Some(optical_path);
        self
    }

    pub fn collide_count(&self) -> u64 {
        self.collide_calls.load(Ordering::Relaxed)
    }
}

impl CollisionKernel for MockCollision {
    fn sample_optical_path_length(&self, rng: &mut dyn RngCore) -> f64 {
        self.sample_calls.fetch_add(1, Ordering::Relaxed);
        match self.optical_path {
            Some(op) => op,
            None => -(1.0 - rng.random::<f64>()).ln(),
        }
    }

    fn macroscopic_total_cross_section(&self, particle: &ParticleState) -> f64 {
        particle
            .cell
            .and_then(|cell| self.cross_sections.get(&cell))
            .copied()
            .unwrap_or(0.0)
    }

    fn collide(
        &self,
        particle: &mut ParticleState,
        bank: &mut ParticleBank,
        _survival_biasing: bool,
        _rng: &mut dyn RngCore,
    ) {
        self.collide_calls.fetch_add(1, Ordering::Relaxed);
        match self.behavior {
            CollideBehavior::Absorb => particle.energy = 0.0,
            CollideBehavior::LoseEnergy(factor) => particle.energy *= factor,
            CollideBehavior::Split {
                energy_factor,
                secondaries,
            } => {
                particle.energy *= energy_factor;
                for _ in 0..secondaries {
                    bank.push(particle.spawn_secondary(particle.particle_type));
                }
            }
        }
    }
}

// ── MonoSource ──────────────────────────────────────────────────

/// Emits a fixed number of identical particles per history.
pub struct MonoSource {
    pub particle_type: ParticleType,
    pub position: [f64; 3],
    pub direction: [f64; 3],
    pub energy: f64,
    pub particles_per_history: usize,
}

impl MonoSource {
    /// One particle per history at `position` moving along +x.
    pub fn new(particle_type: ParticleType, position: [f64; 3], energy: f64) -> Self {
        Self {
            particle_type,
            position,
            direction: [1.0, 0.0, 0.0],
            energy,
            particles_per_history: 1,
        }
    }

    pub fn with_direction(mut self, direction: [f64; 3]) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_particles_per_history(mut self, n: usize) -> Self {
        self.particles_per_history = n;
        self
    }
}

impl ParticleSource for MonoSource {
    fn sample_particle_state(
        &self,
        bank: &mut ParticleBank,
        history: HistoryId,
        _rng: &mut dyn RngCore,
    ) {
        for _ in 0..self.particles_per_history {
            let mut p = ParticleState::new(self.particle_type, history);
            p.position = self.position;
            p.direction = self.direction;
            p.energy = self.energy;
            bank.push(p);
        }
    }
}

// ── RecordingObserver ───────────────────────────────────────────

/// Counts every tally event and keeps per-history traces.
///
/// Event counters are atomics; the per-history collision/track-length
/// maps sit behind a mutex (commit-per-history keeps contention off the
/// hot path in real estimators; a mutex is fine for tests).
#[derive(Default)]
pub struct RecordingObserver {
    pub entering_cell: AtomicU64,
    pub leaving_cell: AtomicU64,
    pub crossing_surface: AtomicU64,
    pub subtrack_in_cell: AtomicU64,
    pub collisions: AtomicU64,
    pub subtrack_global: AtomicU64,
    pub commits: AtomicU64,
    pub started: AtomicU64,
    pub stopped: AtomicU64,
    collisions_by_history: Mutex<BTreeMap<u64, u64>>,
    track_length_by_history: Mutex<BTreeMap<u64, f64>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collision_count(&self) -> u64 {
        self.collisions.load(Ordering::Relaxed)
    }

    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    /// Per-history collision counts, for determinism comparisons.
    pub fn collisions_by_history(&self) -> BTreeMap<u64, u64> {
        self.collisions_by_history.lock().unwrap().clone()
    }

    /// Per-history total track length, for determinism comparisons.
    pub fn track_length_by_history(&self) -> BTreeMap<u64, f64> {
        self.track_length_by_history.lock().unwrap().clone()
    }
}

impl EventObserver for RecordingObserver {
    fn entering_cell(&self, _particle: &ParticleState, _cell: CellId) {
        self.entering_cell.fetch_add(1, Ordering::Relaxed);
    }

    fn leaving_cell(&self, _particle: &ParticleState, _cell: CellId) {
        self.leaving_cell.fetch_add(1, Ordering::Relaxed);
    }

    fn crossing_surface(&self, _particle: &ParticleState, _surface: SurfaceId) {
        self.crossing_surface.fetch_add(1, Ordering::Relaxed);
    }

    fn subtrack_ending_in_cell(
        &self,
        particle: &ParticleState,
        _cell: CellId,
        track_length: f64,
        _start_time: f64,
    ) {
        self.subtrack_in_cell.fetch_add(1, Ordering::Relaxed);
        let mut lengths = self.track_length_by_history.lock().unwrap();
        *lengths.entry(particle.history.0).or_insert(0.0) += track_length;
    }

    fn colliding_in_cell(&self, particle: &ParticleState, _inverse_cross_section: f64) {
        self.collisions.fetch_add(1, Ordering::Relaxed);
        let mut counts = self.collisions_by_history.lock().unwrap();
        *counts.entry(particle.history.0).or_insert(0) += 1;
    }

    fn subtrack_ending_global(&self, _particle: &ParticleState, _start: [f64; 3], _end: [f64; 3]) {
        self.subtrack_global.fetch_add(1, Ordering::Relaxed);
    }

    fn commit_history_contributions(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    fn simulation_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    fn simulation_stopped(&self) {
        self.stopped.fetch_add(1, Ordering::Relaxed);
    }
}
