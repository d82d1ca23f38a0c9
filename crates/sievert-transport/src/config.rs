//! Simulation configuration and validation.

use std::error::Error;
use std::fmt;

use sievert_core::{ParticleMode, ParticleType};

/// Parameters binding one simulation run.
///
/// Validated by [`validate()`](SimulationProperties::validate) at
/// manager construction; an invalid configuration is a caller defect
/// and aborts before any history is simulated.
#[derive(Clone, Debug)]
pub struct SimulationProperties {
    /// Which particle species are actively transported.
    pub mode: ParticleMode,
    /// Total number of histories to simulate. Must be at least 1.
    pub number_of_histories: u64,
    /// Worker threads for the per-history loop. Must be at least 1.
    pub threads: usize,
    /// Base seed combined with each history index to derive that
    /// history's random stream.
    pub base_seed: u64,
    /// Whether collisions use survival biasing (weight reduction
    /// instead of probabilistic kill).
    pub survival_biasing: bool,
    /// Energy below which a neutron is terminated.
    pub min_neutron_energy: f64,
    /// Energy below which a photon is terminated.
    pub min_photon_energy: f64,
    /// Energy below which an electron is terminated.
    pub min_electron_energy: f64,
}

impl SimulationProperties {
    /// Default energy cutoff applied to every species.
    pub const DEFAULT_MIN_ENERGY: f64 = 1e-11;

    /// Properties for `number_of_histories` histories in `mode`, with a
    /// single thread, seed 0, no survival biasing, and default cutoffs.
    pub fn new(mode: ParticleMode, number_of_histories: u64) -> Self {
        Self {
            mode,
            number_of_histories,
            threads: 1,
            base_seed: 0,
            survival_biasing: false,
            min_neutron_energy: Self::DEFAULT_MIN_ENERGY,
            min_photon_energy: Self::DEFAULT_MIN_ENERGY,
            min_electron_energy: Self::DEFAULT_MIN_ENERGY,
        }
    }

    /// The energy cutoff for `particle_type`.
    pub fn min_energy(&self, particle_type: ParticleType) -> f64 {
        match particle_type {
            ParticleType::Neutron => self.min_neutron_energy,
            ParticleType::Photon => self.min_photon_energy,
            ParticleType::Electron => self.min_electron_energy,
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.number_of_histories == 0 {
            return Err(ConfigError::NoHistories);
        }
        if self.threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        for particle_type in [
            ParticleType::Neutron,
            ParticleType::Photon,
            ParticleType::Electron,
        ] {
            let cutoff = self.min_energy(particle_type);
            if !cutoff.is_finite() || cutoff <= 0.0 {
                return Err(ConfigError::InvalidEnergyCutoff {
                    particle_type,
                    value: cutoff,
                });
            }
        }
        Ok(())
    }
}

/// Errors detected during [`SimulationProperties::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// At least one history must be simulated.
    NoHistories,
    /// The thread count is zero.
    ZeroThreads,
    /// An energy cutoff is non-positive, NaN, or infinite.
    InvalidEnergyCutoff {
        /// The species with the invalid cutoff.
        particle_type: ParticleType,
        /// The invalid value.
        value: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoHistories => write!(f, "number_of_histories must be at least 1"),
            Self::ZeroThreads => write!(f, "threads must be at least 1"),
            Self::InvalidEnergyCutoff {
                particle_type,
                value,
            } => write!(
                f,
                "min {particle_type} energy must be finite and positive, got {value}"
            ),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_properties_validate() {
        let props = SimulationProperties::new(ParticleMode::Neutron, 10);
        assert!(props.validate().is_ok());
    }

    #[test]
    fn zero_histories_rejected() {
        let props = SimulationProperties::new(ParticleMode::Neutron, 0);
        assert_eq!(props.validate(), Err(ConfigError::NoHistories));
    }

    #[test]
    fn zero_threads_rejected() {
        let mut props = SimulationProperties::new(ParticleMode::Photon, 1);
        props.threads = 0;
        assert_eq!(props.validate(), Err(ConfigError::ZeroThreads));
    }

    #[test]
    fn non_positive_cutoff_rejected() {
        let mut props = SimulationProperties::new(ParticleMode::Photon, 1);
        props.min_photon_energy = 0.0;
        assert!(matches!(
            props.validate(),
            Err(ConfigError::InvalidEnergyCutoff {
                particle_type: ParticleType::Photon,
                ..
            })
        ));
    }

    #[test]
    fn nan_cutoff_rejected() {
        let mut props = SimulationProperties::new(ParticleMode::Electron, 1);
        props.min_electron_energy = f64::NAN;
        assert!(props.validate().is_err());
    }

    #[test]
    fn per_type_cutoff_lookup() {
        let mut props = SimulationProperties::new(ParticleMode::NeutronPhotonElectron, 1);
        props.min_neutron_energy = 1e-9;
        props.min_photon_energy = 1e-3;
        props.min_electron_energy = 1e-4;
        assert_eq!(props.min_energy(ParticleType::Neutron), 1e-9);
        assert_eq!(props.min_energy(ParticleType::Photon), 1e-3);
        assert_eq!(props.min_energy(ParticleType::Electron), 1e-4);
    }
}
