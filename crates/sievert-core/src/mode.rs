//! The particle mode: which species a run actively transports.

use std::error::Error;
use std::fmt;
use std::str::FromStr;

use crate::particle::ParticleType;

/// The set of particle types a simulation actively transports.
///
/// Particles of a known type that is *not* active in the mode are
/// terminated at dispatch with
/// [`TerminationReason::InactiveInMode`](crate::particle::TerminationReason::InactiveInMode):
/// a photon produced by neutron capture in a neutron-only run is banked
/// by the collision kernel but never tracked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleMode {
    /// Transport neutrons only.
    Neutron,
    /// Transport photons only.
    Photon,
    /// Transport electrons only.
    Electron,
    /// Transport neutrons and the photons they produce.
    NeutronPhoton,
    /// Transport photons and the electrons they produce.
    PhotonElectron,
    /// Transport all three species.
    NeutronPhotonElectron,
}

impl ParticleMode {
    /// Whether particles of `particle_type` are actively simulated in
    /// this mode.
    pub fn simulates(self, particle_type: ParticleType) -> bool {
        match self {
            Self::Neutron => particle_type == ParticleType::Neutron,
            Self::Photon => particle_type == ParticleType::Photon,
            Self::Electron => particle_type == ParticleType::Electron,
            Self::NeutronPhoton => matches!(
                particle_type,
                ParticleType::Neutron | ParticleType::Photon
            ),
            Self::PhotonElectron => matches!(
                particle_type,
                ParticleType::Photon | ParticleType::Electron
            ),
            Self::NeutronPhotonElectron => true,
        }
    }
}

impl fmt::Display for ParticleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Neutron => "neutron",
            Self::Photon => "photon",
            Self::Electron => "electron",
            Self::NeutronPhoton => "neutron-photon",
            Self::PhotonElectron => "photon-electron",
            Self::NeutronPhotonElectron => "neutron-photon-electron",
        };
        write!(f, "{name}")
    }
}

/// An unrecognized particle mode string.
///
/// Raised at configuration time; indicates a configuration defect, not
/// a runtime physics condition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModeError {
    /// The string that failed to parse.
    pub unrecognized: String,
}

impl fmt::Display for ModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized particle mode '{}'", self.unrecognized)
    }
}

impl Error for ModeError {}

impl FromStr for ParticleMode {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "neutron" => Ok(Self::Neutron),
            "photon" => Ok(Self::Photon),
            "electron" => Ok(Self::Electron),
            "neutron-photon" => Ok(Self::NeutronPhoton),
            "photon-electron" => Ok(Self::PhotonElectron),
            "neutron-photon-electron" => Ok(Self::NeutronPhotonElectron),
            other => Err(ModeError {
                unrecognized: other.to_string(),
            }),
        }
    }
}
