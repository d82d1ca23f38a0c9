//! The single-node transport manager and its run state.

use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use sievert_core::{
    CollisionKernel, EventObserver, Fate, HistoryId, HistoryRng, Navigator, ParticleBank,
    ParticleSource,
};

use crate::config::{ConfigError, SimulationProperties};
use crate::diagnostics::{LostParticleReport, SimulationStatus};
use crate::kernel::TrackContext;

/// Fatal errors from the transport loop.
///
/// These indicate a programming or configuration defect rather than a
/// physics condition; they propagate to the run driver, which should
/// terminate with a non-zero status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// `run_simulation_batch` was handed a range outside
    /// `[start_history, history_wall]` or with `end < start`.
    InvalidBatchRange {
        /// Requested batch start.
        batch_start: u64,
        /// Requested batch end (exclusive).
        batch_end: u64,
        /// First history this manager owns.
        start_history: u64,
        /// One past the last history this manager owns.
        history_wall: u64,
    },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBatchRange {
                batch_start,
                batch_end,
                start_history,
                history_wall,
            } => write!(
                f,
                "batch range [{batch_start}, {batch_end}) lies outside \
                 [{start_history}, {history_wall})"
            ),
        }
    }
}

impl Error for TransportError {}

/// Mutable run-progress state, shared across worker threads.
struct RunState {
    /// Completed histories, including any prior interrupted run. The
    /// only counter mutated from multiple threads within a batch.
    histories_completed: AtomicU64,
    /// Cooperative early-termination flag, checked once per history
    /// iteration. Setting it never preempts in-flight histories.
    end_requested: AtomicBool,
    start_time: Mutex<Option<Instant>>,
    run_time: Mutex<Option<Duration>>,
    lost: Mutex<Vec<LostParticleReport>>,
}

/// Owns the per-history simulation loop.
///
/// Advances each particle from birth to termination, dispatching by
/// particle type, and runs independent histories across a thread pool.
/// Each worker thread owns its own [`ParticleBank`] and per-history
/// random stream, so the only cross-thread state is the completed
/// counter and the end flag. Collaborators provide their own
/// thread-safe tally accumulation; the manager calls
/// `commit_history_contributions` exactly once per completed history.
pub struct TransportManager {
    properties: SimulationProperties,
    navigator: Arc<dyn Navigator>,
    collision: Arc<dyn CollisionKernel>,
    source: Arc<dyn ParticleSource>,
    observer: Arc<dyn EventObserver>,
    start_history: u64,
    history_wall: u64,
    previous_run_time: Duration,
    run: RunState,
}

impl TransportManager {
    /// Create a manager for a fresh run starting at history 0.
    pub fn new(
        properties: SimulationProperties,
        navigator: Arc<dyn Navigator>,
        collision: Arc<dyn CollisionKernel>,
        source: Arc<dyn ParticleSource>,
        observer: Arc<dyn EventObserver>,
    ) -> Result<Self, ConfigError> {
        Self::resumed(
            properties,
            navigator,
            collision,
            source,
            observer,
            0,
            0,
            Duration::ZERO,
        )
    }

    /// Create a manager that continues a prior, possibly interrupted
    /// run: histories `[start_history, start_history +
    /// number_of_histories)` remain, `previously_completed` histories
    /// are already banked, and `previous_run_time` is carried into the
    /// summary.
    #[allow(clippy::too_many_arguments)]
    pub fn resumed(
        properties: SimulationProperties,
        navigator: Arc<dyn Navigator>,
        collision: Arc<dyn CollisionKernel>,
        source: Arc<dyn ParticleSource>,
        observer: Arc<dyn EventObserver>,
        start_history: u64,
        previously_completed: u64,
        previous_run_time: Duration,
    ) -> Result<Self, ConfigError> {
        properties.validate()?;
        let history_wall = start_history + properties.number_of_histories;
        Ok(Self {
            properties,
            navigator,
            collision,
            source,
            observer,
            start_history,
            history_wall,
            previous_run_time,
            run: RunState {
                histories_completed: AtomicU64::new(previously_completed),
                end_requested: AtomicBool::new(false),
                start_time: Mutex::new(None),
                run_time: Mutex::new(None),
                lost: Mutex::new(Vec::new()),
            },
        })
    }

    /// Run the full configured history range.
    pub fn run_simulation(&self) -> Result<(), TransportError> {
        self.observer.simulation_started();
        *self.run.start_time.lock().unwrap() = Some(Instant::now());

        let result = self.run_simulation_batch(self.start_history, self.history_wall);

        let elapsed = self
            .run
            .start_time
            .lock()
            .unwrap()
            .map(|t| t.elapsed())
            .unwrap_or_default();
        *self.run.run_time.lock().unwrap() = Some(elapsed);
        self.observer.simulation_stopped();
        result
    }

    /// Run the histories in `[batch_start, batch_end)` across the
    /// configured thread count.
    ///
    /// Histories are independent: each gets its own bank and its own
    /// random stream keyed by the history index, so there is no
    /// ordering guarantee and none is needed.
    pub fn run_simulation_batch(
        &self,
        batch_start: u64,
        batch_end: u64,
    ) -> Result<(), TransportError> {
        if batch_start < self.start_history
            || batch_end < batch_start
            || batch_end > self.history_wall
        {
            return Err(TransportError::InvalidBatchRange {
                batch_start,
                batch_end,
                start_history: self.start_history,
                history_wall: self.history_wall,
            });
        }

        let threads = self.properties.threads;
        std::thread::scope(|scope| {
            for (chunk_start, chunk_end) in chunk_range(batch_start, batch_end, threads) {
                scope.spawn(move || self.run_history_chunk(chunk_start, chunk_end));
            }
        });
        Ok(())
    }

    fn run_history_chunk(&self, start: u64, end: u64) {
        let mut bank = ParticleBank::new();
        for history in start..end {
            // Cooperative cancellation: skip remaining histories once
            // the flag is observed; in-flight histories still finish.
            if self.run.end_requested.load(Ordering::Relaxed) {
                break;
            }
            self.simulate_history(HistoryId(history), &mut bank);
            self.observer.commit_history_contributions();
            self.run.histories_completed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Simulate one complete history: source emission through all
    /// generations of secondaries, until the bank is empty.
    fn simulate_history(&self, history: HistoryId, bank: &mut ParticleBank) {
        debug_assert!(bank.is_empty(), "bank must be empty between histories");
        let mut rng = HistoryRng::for_history(self.properties.base_seed, history);

        self.source.sample_particle_state(bank, history, &mut rng);

        // Locate each source particle at birth. A lost source particle
        // does not abort the history; siblings continue.
        for particle in bank.iter_mut() {
            match self
                .navigator
                .find_cell_containing(particle.position, particle.direction)
            {
                Ok(cell) => {
                    particle.cell = Some(cell);
                    self.observer.entering_cell(particle, cell);
                }
                Err(err) => particle.mark_lost(err),
            }
        }

        let ctx = TrackContext {
            navigator: self.navigator.as_ref(),
            collision: self.collision.as_ref(),
            observer: self.observer.as_ref(),
            properties: &self.properties,
        };

        while let Some(mut particle) = bank.pop() {
            if particle.is_alive() {
                ctx.simulate_particle(&mut particle, bank, &mut rng);
            }
            if let Fate::Lost(err) = particle.fate() {
                let report = LostParticleReport::capture(&particle, err.clone());
                self.run.lost.lock().unwrap().push(report);
            }
        }
    }

    /// Request cooperative early termination. Observed by every worker
    /// thread before it starts its next history.
    pub fn request_end(&self) {
        self.run.end_requested.store(true, Ordering::Relaxed);
    }

    /// Whether early termination has been requested.
    pub fn end_requested(&self) -> bool {
        self.run.end_requested.load(Ordering::Relaxed)
    }

    /// Completed histories, including any prior interrupted run.
    pub fn histories_completed(&self) -> u64 {
        self.run.histories_completed.load(Ordering::Relaxed)
    }

    /// Number of histories this manager owns.
    pub fn number_of_histories(&self) -> u64 {
        self.history_wall - self.start_history
    }

    /// First history index of this run.
    pub fn start_history(&self) -> u64 {
        self.start_history
    }

    /// One past the last history index of this run.
    pub fn history_wall(&self) -> u64 {
        self.history_wall
    }

    /// The simulation properties this manager was built with.
    pub fn properties(&self) -> &SimulationProperties {
        &self.properties
    }

    /// Reports for every particle lost to a navigation failure so far.
    pub fn lost_particles(&self) -> Vec<LostParticleReport> {
        self.run.lost.lock().unwrap().clone()
    }

    /// Wall-clock time of this run: final if finished, running if not.
    pub fn run_time(&self) -> Duration {
        if let Some(total) = *self.run.run_time.lock().unwrap() {
            return total;
        }
        self.run
            .start_time
            .lock()
            .unwrap()
            .map(|t| t.elapsed())
            .unwrap_or_default()
    }

    /// Point-in-time progress snapshot.
    pub fn status(&self) -> SimulationStatus {
        SimulationStatus {
            histories_completed: self.histories_completed(),
            run_time: self.run_time(),
        }
    }

    /// Print the run summary: history counts, timings, and any
    /// lost-particle dumps.
    pub fn print_simulation_summary(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(
            out,
            "histories completed: {}",
            self.histories_completed()
        )?;
        writeln!(
            out,
            "simulation time (s): {:.3}",
            self.run_time().as_secs_f64()
        )?;
        if self.previous_run_time > Duration::ZERO {
            writeln!(
                out,
                "previous simulation time (s): {:.3}",
                self.previous_run_time.as_secs_f64()
            )?;
        }
        let lost = self.run.lost.lock().unwrap();
        if !lost.is_empty() {
            writeln!(out, "lost particles: {}", lost.len())?;
            for report in lost.iter() {
                writeln!(out, "  {report}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for TransportManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportManager")
            .field("mode", &self.properties.mode)
            .field("start_history", &self.start_history)
            .field("history_wall", &self.history_wall)
            .field("histories_completed", &self.histories_completed())
            .field("end_requested", &self.end_requested())
            .finish()
    }
}

/// Split `[start, end)` into at most `parts` contiguous chunks whose
/// union is exactly the input range.
fn chunk_range(start: u64, end: u64, parts: usize) -> Vec<(u64, u64)> {
    let total = end - start;
    let parts = (parts as u64).clamp(1, total.max(1));
    (0..parts)
        .map(|i| {
            (
                start + i * total / parts,
                start + (i + 1) * total / parts,
            )
        })
        .filter(|(s, e)| s < e)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_cover_range_exactly() {
        for parts in 1..=8 {
            let chunks = chunk_range(3, 103, parts);
            assert_eq!(chunks.first().unwrap().0, 3);
            assert_eq!(chunks.last().unwrap().1, 103);
            for pair in chunks.windows(2) {
                assert_eq!(pair[0].1, pair[1].0, "chunks must be contiguous");
            }
            let total: u64 = chunks.iter().map(|(s, e)| e - s).sum();
            assert_eq!(total, 100);
        }
    }

    #[test]
    fn more_parts_than_histories_degrades_gracefully() {
        let chunks = chunk_range(0, 3, 16);
        let total: u64 = chunks.iter().map(|(s, e)| e - s).sum();
        assert_eq!(total, 3);
        assert!(chunks.iter().all(|(s, e)| s < e));
    }

    #[test]
    fn empty_range_yields_no_chunks() {
        assert!(chunk_range(5, 5, 4).is_empty());
    }
}
