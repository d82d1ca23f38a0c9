//! Master/worker batch coordination.
//!
//! The master owns the batch plan and hands one batch to whichever
//! worker reports idle next, so fast workers naturally take more
//! batches. Once the plan is exhausted it stops every worker and
//! collects their final completed-history counts. Workers loop:
//! report idle, receive an assignment, simulate it, repeat until the
//! stop sentinel arrives.

use std::time::Duration;

use indexmap::IndexMap;

use sievert_transport::{TransportError, TransportManager};

use crate::comm::{BatchRange, CommError, Communicator, Message, Rank};
use crate::plan::{BatchPlan, PlanError};

/// Fatal coordinator failures.
#[derive(Clone, Debug, PartialEq)]
pub enum CoordinatorError {
    /// Message passing broke down.
    Comm(CommError),
    /// The batch plan could not be built.
    Plan(PlanError),
    /// A worker's transport manager rejected a batch.
    Transport(TransportError),
    /// A rank sent a message the protocol does not allow in the current
    /// phase.
    Protocol {
        /// The offending rank.
        from: Rank,
        /// What was wrong with the message.
        reason: String,
    },
}

impl std::fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Comm(err) => write!(f, "communication failed: {err}"),
            Self::Plan(err) => write!(f, "batch plan rejected: {err}"),
            Self::Transport(err) => write!(f, "transport rejected a batch: {err}"),
            Self::Protocol { from, reason } => {
                write!(f, "protocol violation by {from}: {reason}")
            }
        }
    }
}

impl std::error::Error for CoordinatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Comm(err) => Some(err),
            Self::Plan(err) => Some(err),
            Self::Transport(err) => Some(err),
            Self::Protocol { .. } => None,
        }
    }
}

impl From<CommError> for CoordinatorError {
    fn from(err: CommError) -> Self {
        Self::Comm(err)
    }
}

impl From<PlanError> for CoordinatorError {
    fn from(err: PlanError) -> Self {
        Self::Plan(err)
    }
}

impl From<TransportError> for CoordinatorError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

/// Escalating wait for the master's probe loop: spin first, then yield,
/// then sleep with a capped exponential, so an idle master costs little
/// while a busy one reacts within a poll.
struct PollBackoff {
    idle_polls: u32,
}

impl PollBackoff {
    const SPIN_POLLS: u32 = 64;
    const YIELD_POLLS: u32 = 192;
    const MAX_SLEEP: Duration = Duration::from_millis(1);

    fn new() -> Self {
        Self { idle_polls: 0 }
    }

    fn reset(&mut self) {
        self.idle_polls = 0;
    }

    fn wait(&mut self) {
        self.idle_polls = self.idle_polls.saturating_add(1);
        if self.idle_polls <= Self::SPIN_POLLS {
            std::hint::spin_loop();
        } else if self.idle_polls <= Self::YIELD_POLLS {
            std::thread::yield_now();
        } else {
            let exp = (self.idle_polls - Self::YIELD_POLLS).min(10);
            let sleep = Duration::from_micros(1u64 << exp);
            std::thread::sleep(sleep.min(Self::MAX_SLEEP));
        }
    }
}

fn recv_polling<C: Communicator>(
    comm: &C,
    backoff: &mut PollBackoff,
) -> Result<(Rank, Message), CoordinatorError> {
    loop {
        if let Some(received) = comm.try_recv()? {
            backoff.reset();
            return Ok(received);
        }
        backoff.wait();
    }
}

/// Run the master side: dispatch every batch in `plan` to idle workers,
/// stop the workers, and return the grand total of completed histories
/// (including `previously_completed`).
pub fn run_master<C: Communicator>(
    comm: &C,
    plan: &BatchPlan,
    previously_completed: u64,
) -> Result<u64, CoordinatorError> {
    let workers = comm.world_size() - 1;
    let mut backoff = PollBackoff::new();

    // Dispatch phase: one batch per idle report, in plan order.
    for batch in plan.batches() {
        let (from, message) = recv_polling(comm, &mut backoff)?;
        match message {
            Message::Idle { .. } => comm.send(from, Message::Assign(batch))?,
            Message::Assign(_) => {
                return Err(CoordinatorError::Protocol {
                    from,
                    reason: "workers must not send batch assignments".to_string(),
                })
            }
        }
    }

    // Drain phase: stop every worker, then collect exactly one final
    // idle report per worker.
    for worker in 1..=workers {
        comm.send(Rank(worker), Message::Assign(BatchRange::STOP))?;
    }

    let mut final_counts: IndexMap<Rank, u64> = IndexMap::with_capacity(workers);
    while final_counts.len() < workers {
        let (from, message) = recv_polling(comm, &mut backoff)?;
        match message {
            Message::Idle { completed } => {
                if final_counts.insert(from, completed).is_some() {
                    return Err(CoordinatorError::Protocol {
                        from,
                        reason: "duplicate final idle report".to_string(),
                    });
                }
            }
            Message::Assign(_) => {
                return Err(CoordinatorError::Protocol {
                    from,
                    reason: "workers must not send batch assignments".to_string(),
                })
            }
        }
    }

    comm.barrier();
    Ok(previously_completed + final_counts.values().sum::<u64>())
}

/// Run the worker side: report idle, simulate each assigned batch, and
/// shut down on the stop sentinel.
pub fn run_worker<C: Communicator>(
    comm: &C,
    manager: &TransportManager,
) -> Result<(), CoordinatorError> {
    loop {
        comm.send(
            Rank::MASTER,
            Message::Idle {
                completed: manager.histories_completed(),
            },
        )?;
        match comm.recv()? {
            (_, Message::Assign(batch)) if batch.is_stop() => break,
            (_, Message::Assign(batch)) => {
                manager.run_simulation_batch(batch.start, batch.end)?;
            }
            (from, Message::Idle { .. }) => {
                return Err(CoordinatorError::Protocol {
                    from,
                    reason: "only workers send idle reports".to_string(),
                })
            }
        }
    }
    comm.barrier();
    Ok(())
}

/// Run a distributed simulation on this rank.
///
/// The master partitions the manager's history range into
/// `batches_per_worker` batches per worker and coordinates; workers
/// simulate. Returns the grand total of completed histories on the
/// master, `None` on workers.
pub fn run_distributed<C: Communicator>(
    comm: &C,
    manager: &TransportManager,
    batches_per_worker: u64,
) -> Result<Option<u64>, CoordinatorError> {
    let workers = comm.world_size().saturating_sub(1) as u64;
    if comm.rank() == Rank::MASTER {
        let plan = BatchPlan::new(
            manager.start_history(),
            manager.history_wall(),
            batches_per_worker.saturating_mul(workers),
        )?;
        let total = run_master(comm, &plan, manager.histories_completed())?;
        Ok(Some(total))
    } else {
        run_worker(comm, manager)?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::ChannelComm;

    #[test]
    fn backoff_escalates_and_resets() {
        let mut backoff = PollBackoff::new();
        for _ in 0..300 {
            backoff.wait();
        }
        assert!(backoff.idle_polls > PollBackoff::YIELD_POLLS);
        backoff.reset();
        assert_eq!(backoff.idle_polls, 0);
    }

    #[test]
    fn master_rejects_assignment_from_worker() {
        let mut world = ChannelComm::world(2);
        let worker = world.pop().unwrap();
        let master = world.pop().unwrap();

        worker
            .send(Rank::MASTER, Message::Assign(BatchRange { start: 0, end: 1 }))
            .unwrap();

        let plan = BatchPlan::new(0, 10, 2).unwrap();
        let err = run_master(&master, &plan, 0).unwrap_err();
        assert!(matches!(
            err,
            CoordinatorError::Protocol { from: Rank(1), .. }
        ));
    }

    #[test]
    fn error_conversions_preserve_sources() {
        let err: CoordinatorError = PlanError::NoBatches.into();
        assert_eq!(err, CoordinatorError::Plan(PlanError::NoBatches));
        assert!(std::error::Error::source(&err).is_some());

        let err: CoordinatorError = CommError::Disconnected { rank: Rank(3) }.into();
        assert!(err.to_string().contains("rank 3"));
    }
}
