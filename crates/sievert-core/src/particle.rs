//! Particle state and lifecycle.

use std::fmt;

use crate::error::NavigationError;
use crate::id::{CellId, HistoryId};

/// The particle species the kernel can transport.
///
/// A closed set, matched exhaustively at the dispatch site in the
/// per-history loop. Species outside the configured
/// [`ParticleMode`](crate::mode::ParticleMode) are terminated with
/// [`TerminationReason::InactiveInMode`] rather than simulated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParticleType {
    /// A neutron.
    Neutron,
    /// A photon.
    Photon,
    /// An electron.
    Electron,
}

impl fmt::Display for ParticleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Neutron => write!(f, "neutron"),
            Self::Photon => write!(f, "photon"),
            Self::Electron => write!(f, "electron"),
        }
    }
}

/// Why a particle terminated normally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminationReason {
    /// The particle crossed into a termination (graveyard) cell.
    LeftModel,
    /// The particle's energy dropped below the per-type cutoff.
    BelowEnergyCutoff,
    /// The particle's type is not active in the configured mode.
    InactiveInMode,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeftModel => write!(f, "left the model"),
            Self::BelowEnergyCutoff => write!(f, "below energy cutoff"),
            Self::InactiveInMode => write!(f, "inactive in simulation mode"),
        }
    }
}

/// Terminal state of a particle.
///
/// `Gone` is normal termination (left the model, fell below the energy
/// cutoff, or ignored by the mode). `Lost` is abnormal termination: the
/// geometry engine could not navigate the particle, which ends its
/// simulation but never aborts the run.
#[derive(Clone, Debug, PartialEq)]
pub enum Fate {
    /// Still requires simulation.
    Alive,
    /// Terminated normally.
    Gone(TerminationReason),
    /// Terminated abnormally by a navigation failure.
    Lost(NavigationError),
}

/// One particle's kinetic state.
///
/// Created by the source at the start of a history (generation 0) or by
/// the collision kernel when a collision produces secondaries
/// (generation N+1); dropped when the transport manager observes it is
/// [`Fate::Lost`] or [`Fate::Gone`].
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleState {
    /// Species tag used for dispatch and cutoff lookup.
    pub particle_type: ParticleType,
    /// Position in model coordinates.
    pub position: [f64; 3],
    /// Direction of flight (unit vector).
    pub direction: [f64; 3],
    /// Kinetic energy.
    pub energy: f64,
    /// Elapsed time since source emission.
    pub time: f64,
    /// Statistical weight (reduced by survival biasing rather than
    /// probabilistic kill).
    pub weight: f64,
    /// The cell currently containing the particle. `None` until the
    /// navigator has located the particle at birth.
    pub cell: Option<CellId>,
    /// The history this particle belongs to.
    pub history: HistoryId,
    /// Secondary generation depth: 0 for source particles, parent + 1
    /// for collision secondaries.
    pub generation: u32,
    fate: Fate,
}

impl ParticleState {
    /// Create a generation-0 particle with default kinematics.
    ///
    /// Position at the origin, direction +z, unit energy and weight,
    /// zero time, no cell. Sources overwrite the kinematic fields
    /// before banking the state.
    pub fn new(particle_type: ParticleType, history: HistoryId) -> Self {
        Self {
            particle_type,
            position: [0.0; 3],
            direction: [0.0, 0.0, 1.0],
            energy: 1.0,
            time: 0.0,
            weight: 1.0,
            cell: None,
            history,
            generation: 0,
            fate: Fate::Alive,
        }
    }

    /// Create a secondary at this particle's current phase-space point.
    ///
    /// The secondary inherits position, direction, time, weight, cell,
    /// and history, with `generation` incremented. Collision kernels
    /// adjust energy/direction/type before banking it.
    pub fn spawn_secondary(&self, particle_type: ParticleType) -> Self {
        Self {
            particle_type,
            position: self.position,
            direction: self.direction,
            energy: self.energy,
            time: self.time,
            weight: self.weight,
            cell: self.cell,
            history: self.history,
            generation: self.generation + 1,
            fate: Fate::Alive,
        }
    }

    /// The particle's terminal state.
    pub fn fate(&self) -> &Fate {
        &self.fate
    }

    /// Whether the particle still requires simulation.
    pub fn is_alive(&self) -> bool {
        matches!(self.fate, Fate::Alive)
    }

    /// Whether the particle terminated normally.
    pub fn is_gone(&self) -> bool {
        matches!(self.fate, Fate::Gone(_))
    }

    /// Whether the particle was lost to a navigation failure.
    pub fn is_lost(&self) -> bool {
        matches!(self.fate, Fate::Lost(_))
    }

    /// Terminate the particle normally.
    ///
    /// Terminal states are final: marking an already-terminal particle
    /// is a caller bug (checked in debug builds).
    pub fn mark_gone(&mut self, reason: TerminationReason) {
        debug_assert!(self.is_alive(), "fate is final once set");
        self.fate = Fate::Gone(reason);
    }

    /// Terminate the particle abnormally with the navigation failure
    /// that caused it.
    pub fn mark_lost(&mut self, error: NavigationError) {
        debug_assert!(self.is_alive(), "fate is final once set");
        self.fate = Fate::Lost(error);
    }

    /// Move the particle `distance` along its direction of flight.
    pub fn advance(&mut self, distance: f64) {
        self.position[0] += distance * self.direction[0];
        self.position[1] += distance * self.direction[1];
        self.position[2] += distance * self.direction[2];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_particle_is_alive_generation_zero() {
        let p = ParticleState::new(ParticleType::Neutron, HistoryId(7));
        assert!(p.is_alive());
        assert!(!p.is_gone());
        assert!(!p.is_lost());
        assert_eq!(p.generation, 0);
        assert_eq!(p.history, HistoryId(7));
        assert_eq!(p.cell, None);
    }

    #[test]
    fn secondary_inherits_phase_space_and_increments_generation() {
        let mut parent = ParticleState::new(ParticleType::Neutron, HistoryId(3));
        parent.position = [1.0, 2.0, 3.0];
        parent.direction = [1.0, 0.0, 0.0];
        parent.cell = Some(CellId(9));
        parent.generation = 2;

        let child = parent.spawn_secondary(ParticleType::Photon);
        assert_eq!(child.particle_type, ParticleType::Photon);
        assert_eq!(child.position, parent.position);
        assert_eq!(child.cell, Some(CellId(9)));
        assert_eq!(child.history, HistoryId(3));
        assert_eq!(child.generation, 3);
        assert!(child.is_alive());
    }

    #[test]
    fn mark_gone_sets_terminal_state() {
        let mut p = ParticleState::new(ParticleType::Photon, HistoryId(0));
        p.mark_gone(TerminationReason::LeftModel);
        assert!(p.is_gone());
        assert_eq!(p.fate(), &Fate::Gone(TerminationReason::LeftModel));
    }

    #[test]
    fn mark_lost_records_navigation_error() {
        let mut p = ParticleState::new(ParticleType::Electron, HistoryId(0));
        p.mark_lost(NavigationError::RayTraceFailed {
            reason: "degenerate surface".into(),
        });
        assert!(p.is_lost());
        assert!(!p.is_gone());
    }

    #[test]
    fn advance_moves_along_direction() {
        let mut p = ParticleState::new(ParticleType::Neutron, HistoryId(0));
        p.position = [1.0, 0.0, 0.0];
        p.direction = [0.0, 1.0, 0.0];
        p.advance(2.5);
        assert_eq!(p.position, [1.0, 2.5, 0.0]);
    }
}
