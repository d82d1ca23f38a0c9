//! Single-node Monte Carlo particle transport manager.
//!
//! [`TransportManager`] owns the per-history simulation loop: it
//! advances each particle from birth to termination against the
//! geometry and collision collaborators, accumulates tally events,
//! and runs independent histories across a thread pool. The
//! distributed batch coordinator in `sievert-batch` drives the same
//! manager with dynamically assigned history ranges.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod control;
pub mod diagnostics;
mod kernel;
pub mod manager;

pub use config::{ConfigError, SimulationProperties};
pub use control::{ControlCommand, ControlError, ControlOutcome};
pub use diagnostics::{LostParticleReport, SimulationStatus};
pub use manager::{TransportError, TransportManager};
