//! Structured run diagnostics: lost-particle dumps and status lines.

use std::fmt;
use std::time::Duration;

use sievert_core::{CellId, HistoryId, NavigationError, ParticleState, ParticleType};

/// Full state dump for a particle lost to a navigation failure.
///
/// Lost particles never abort a run; the report captures everything
/// needed to reproduce the failure offline. Rendered in the simulation
/// summary.
#[derive(Clone, Debug, PartialEq)]
pub struct LostParticleReport {
    /// History the particle belonged to.
    pub history: HistoryId,
    /// Secondary generation depth.
    pub generation: u32,
    /// Species tag.
    pub particle_type: ParticleType,
    /// The cell the particle was in, if it had been located.
    pub cell: Option<CellId>,
    /// Position at the time of loss.
    pub position: [f64; 3],
    /// Direction at the time of loss.
    pub direction: [f64; 3],
    /// Energy at the time of loss.
    pub energy: f64,
    /// The navigation failure that lost the particle.
    pub error: NavigationError,
}

impl LostParticleReport {
    /// Capture a report from a lost particle's state.
    pub fn capture(particle: &ParticleState, error: NavigationError) -> Self {
        Self {
            history: particle.history,
            generation: particle.generation,
            particle_type: particle.particle_type,
            cell: particle.cell,
            position: particle.position,
            direction: particle.direction,
            energy: particle.energy,
            error,
        }
    }
}

impl fmt::Display for LostParticleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lost {} (history {}, generation {}): cell ",
            self.particle_type, self.history, self.generation
        )?;
        match self.cell {
            Some(cell) => write!(f, "{cell}")?,
            None => write!(f, "unlocated")?,
        }
        write!(
            f,
            ", position ({:.6e}, {:.6e}, {:.6e}), direction ({:.6}, {:.6}, {:.6}), energy {:.6e}: {}",
            self.position[0],
            self.position[1],
            self.position[2],
            self.direction[0],
            self.direction[1],
            self.direction[2],
            self.energy,
            self.error
        )
    }
}

/// Point-in-time run progress, printed by the status control command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationStatus {
    /// Histories completed so far (including any prior interrupted run).
    pub histories_completed: u64,
    /// Wall-clock time spent in this run so far.
    pub run_time: Duration,
}

impl fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "history: {}, run time: {:.3} s",
            self.histories_completed,
            self.run_time.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_captures_particle_state() {
        let mut p = ParticleState::new(ParticleType::Photon, HistoryId(42));
        p.generation = 3;
        p.cell = Some(CellId(7));
        p.position = [1.0, 2.0, 3.0];
        p.energy = 0.5;

        let report = LostParticleReport::capture(
            &p,
            NavigationError::RayTraceFailed {
                reason: "test".into(),
            },
        );
        assert_eq!(report.history, HistoryId(42));
        assert_eq!(report.generation, 3);
        assert_eq!(report.cell, Some(CellId(7)));

        let text = report.to_string();
        assert!(text.contains("history 42"));
        assert!(text.contains("photon"));
        assert!(text.contains("cell 7"));
        assert!(text.contains("ray trace failed"));
    }

    #[test]
    fn unlocated_cell_renders() {
        let p = ParticleState::new(ParticleType::Neutron, HistoryId(0));
        let report = LostParticleReport::capture(
            &p,
            NavigationError::PointNotInModel {
                reason: "outside".into(),
            },
        );
        assert!(report.to_string().contains("cell unlocated"));
    }

    #[test]
    fn status_line_format() {
        let status = SimulationStatus {
            histories_completed: 12,
            run_time: Duration::from_millis(1500),
        };
        assert_eq!(status.to_string(), "history: 12, run time: 1.500 s");
    }
}
